//! # Stock Repository
//!
//! Row-level access for the Stock Ledger: the product stock counter and the
//! append-only movement journal.
//!
//! ## Counter Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: read-then-write (lost update under concurrency)              │
//! │     let stock = SELECT stock ...;                                       │
//! │     UPDATE products SET stock = {stock - qty} ...                       │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement                                  │
//! │     UPDATE products SET stock = stock - ?qty                            │
//! │     WHERE id = ? AND stock >= ?qty                                      │
//! │                                                                         │
//! │  rows_affected == 0 means the stock was NOT there; the counter is       │
//! │  untouched and the caller aborts its transaction.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The public surface is read-only (history queries). All writes are
//! tx-scoped and driven by the ledger engine so that every counter change
//! commits atomically with its movement row.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};
use vendia_core::{MovementKind, StockMovement};

const MOVEMENT_COLUMNS: &str = r#"
    id, account_id, product_id, supplier_id, sale_id, kind,
    quantity, unit_cost_cents, reason, notes, created_at
"#;

/// Repository for stock movements and the stock counter.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    // =========================================================================
    // Reads (movement journal)
    // =========================================================================

    /// Lists a product's movement history, newest first.
    pub async fn history(&self, account_id: i64, product_id: i64) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM stock_movements
            WHERE account_id = ?1 AND product_id = ?2
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(account_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists the `out` movements a sale produced, one per tracked line.
    pub async fn movements_for_sale(&self, sale_id: i64) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM stock_movements
            WHERE sale_id = ?1
            ORDER BY id
            "#
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    // =========================================================================
    // Tx-scoped writes (ledger engine only)
    // =========================================================================

    /// Appends one movement row. Movements are never updated or deleted.
    pub(crate) async fn insert_movement_tx(
        conn: &mut SqliteConnection,
        movement: &StockMovement,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO stock_movements (account_id, product_id, supplier_id, sale_id,
                                         kind, quantity, unit_cost_cents, reason, notes,
                                         created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(movement.account_id)
        .bind(movement.product_id)
        .bind(movement.supplier_id)
        .bind(movement.sale_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.unit_cost_cents)
        .bind(&movement.reason)
        .bind(&movement.notes)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Unconditionally adds to the counter (stock-in).
    pub(crate) async fn increment_stock_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        product_id: i64,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?3, updated_at = ?4
            WHERE id = ?1 AND account_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(account_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Conditionally subtracts from the counter (stock-out).
    ///
    /// Returns `false` without touching the row when the stock is not there;
    /// this is the authoritative check of the sale flow, check and decrement
    /// in one statement.
    pub(crate) async fn decrement_stock_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        product_id: i64,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?3, updated_at = ?4
            WHERE id = ?1 AND account_id = ?2 AND stock >= ?3
            "#,
        )
        .bind(product_id)
        .bind(account_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets the counter to an absolute level (adjustment).
    pub(crate) async fn set_stock_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        product_id: i64,
        new_stock: i64,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = ?3, updated_at = ?4
            WHERE id = ?1 AND account_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(account_id)
        .bind(new_stock)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Reads the current counter inside the caller's transaction.
    pub(crate) async fn current_stock_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        product_id: i64,
    ) -> DbResult<Option<i64>> {
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1 AND account_id = ?2")
                .bind(product_id)
                .bind(account_id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(stock)
    }
}

/// Builds an unsaved movement row for the ledger engine.
pub(crate) fn movement(
    account_id: i64,
    product_id: i64,
    kind: MovementKind,
    quantity: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> StockMovement {
    StockMovement {
        id: 0,
        account_id,
        product_id,
        supplier_id: None,
        sale_id: None,
        kind,
        quantity,
        unit_cost_cents: None,
        reason: reason.to_string(),
        notes: None,
        created_at: now,
    }
}
