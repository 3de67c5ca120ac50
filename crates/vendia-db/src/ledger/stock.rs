//! # Stock Ledger Operations
//!
//! The three stock operations. Each produces exactly one movement row plus
//! one counter update, committed as a single transaction:
//!
//! ```text
//! add_stock     stock += qty          movement: in   (supplier, unit cost)
//! reduce_stock  stock -= qty          movement: out  (caller's reason)
//!               fails if qty > stock, counter untouched
//! adjust_stock  stock  = new level    movement: adjustment (signed delta)
//! ```
//!
//! `reduce_stock` expresses check-and-decrement as ONE conditional UPDATE,
//! so concurrent callers on the same product serialize on the row instead of
//! racing a read against a write.

use chrono::Utc;
use tracing::{debug, info};

use crate::ledger::{Ledger, LedgerResult};
use crate::repository::party::PartyRepository;
use crate::repository::product::ProductRepository;
use crate::repository::stock::{self, StockRepository};
use vendia_core::validation::{
    validate_new_stock, validate_price_cents, validate_quantity, validate_reason,
};
use vendia_core::{CoreError, MovementKind, StockMovement};

impl Ledger {
    /// Receives stock into a product.
    ///
    /// ## Arguments
    /// * `supplier_id` - Source of the goods, when known
    /// * `unit_cost_cents` - Acquisition cost per unit, when known
    ///
    /// There is no upper bound on the resulting level.
    pub async fn add_stock(
        &self,
        account_id: i64,
        product_id: i64,
        quantity: i64,
        supplier_id: Option<i64>,
        unit_cost_cents: Option<i64>,
        notes: Option<&str>,
    ) -> LedgerResult<StockMovement> {
        validate_quantity(quantity)?;
        if let Some(cost) = unit_cost_cents {
            validate_price_cents(cost)?;
        }

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let product = ProductRepository::get_tx(&mut tx, account_id, product_id)
            .await?
            .ok_or(CoreError::ProductNotFound(product_id))?;

        if let Some(supplier_id) = supplier_id {
            PartyRepository::get_supplier_tx(&mut tx, account_id, supplier_id)
                .await?
                .ok_or(CoreError::SupplierNotFound(supplier_id))?;
        }

        let mut movement = stock::movement(
            account_id,
            product_id,
            MovementKind::In,
            quantity,
            "restock",
            now,
        );
        movement.supplier_id = supplier_id;
        movement.unit_cost_cents = unit_cost_cents;
        movement.notes = notes.map(str::to_string);

        movement.id = StockRepository::insert_movement_tx(&mut tx, &movement).await?;
        StockRepository::increment_stock_tx(&mut tx, account_id, product_id, quantity, now)
            .await?;

        tx.commit().await?;

        info!(
            account_id,
            product_id,
            quantity,
            new_stock = product.stock + quantity,
            "Stock received"
        );

        Ok(movement)
    }

    /// Takes stock out of a product.
    ///
    /// Fails with [`CoreError::InsufficientStock`] when `quantity` exceeds
    /// the current level; the counter is left untouched in that case.
    pub async fn reduce_stock(
        &self,
        account_id: i64,
        product_id: i64,
        quantity: i64,
        reason: &str,
        notes: Option<&str>,
    ) -> LedgerResult<StockMovement> {
        validate_quantity(quantity)?;
        validate_reason(reason)?;

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let product = ProductRepository::get_tx(&mut tx, account_id, product_id)
            .await?
            .ok_or(CoreError::ProductNotFound(product_id))?;

        // Check and decrement in one statement; zero rows means the stock
        // was not there. The transaction is dropped unchanged.
        let decremented =
            StockRepository::decrement_stock_tx(&mut tx, account_id, product_id, quantity, now)
                .await?;
        if !decremented {
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: quantity,
            }
            .into());
        }

        let mut movement = stock::movement(
            account_id,
            product_id,
            MovementKind::Out,
            quantity,
            reason,
            now,
        );
        movement.notes = notes.map(str::to_string);
        movement.id = StockRepository::insert_movement_tx(&mut tx, &movement).await?;

        tx.commit().await?;

        debug!(account_id, product_id, quantity, reason, "Stock reduced");

        Ok(movement)
    }

    /// Sets a product's stock to an absolute level.
    ///
    /// The movement records the signed delta between the old and new level;
    /// `new_stock` itself must not be negative.
    pub async fn adjust_stock(
        &self,
        account_id: i64,
        product_id: i64,
        new_stock: i64,
        reason: Option<&str>,
        notes: Option<&str>,
    ) -> LedgerResult<StockMovement> {
        validate_new_stock(new_stock)?;

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let product = ProductRepository::get_tx(&mut tx, account_id, product_id)
            .await?
            .ok_or(CoreError::ProductNotFound(product_id))?;

        let delta = new_stock - product.stock;

        let mut movement = stock::movement(
            account_id,
            product_id,
            MovementKind::Adjustment,
            delta,
            reason.unwrap_or("adjustment"),
            now,
        );
        movement.notes = notes.map(str::to_string);

        movement.id = StockRepository::insert_movement_tx(&mut tx, &movement).await?;
        StockRepository::set_stock_tx(&mut tx, account_id, product_id, new_stock, now).await?;

        tx.commit().await?;

        info!(
            account_id,
            product_id,
            old_stock = product.stock,
            new_stock,
            delta,
            "Stock adjusted"
        );

        Ok(movement)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
