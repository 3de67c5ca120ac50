//! # Ledger Module
//!
//! The transaction engine of Vendia: every operation that moves money or
//! stock lives here, each one an all-or-nothing unit.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Ledger                                        │
//! │                                                                         │
//! │  Stock        add_stock / reduce_stock / adjust_stock                   │
//! │               one movement + one counter update per call                │
//! │                                                                         │
//! │  Sales        create_sale                                               │
//! │               validate → price → stock check → commit (one tx):         │
//! │               number, sale, lines, movements, decrements,               │
//! │               serial records, receivable                                │
//! │                                                                         │
//! │  Debts        add_payment                                               │
//! │               balance update + payment row (one tx)                     │
//! │                                                                         │
//! │  Quotations   create_quotation / convert_quotation                      │
//! │               conversion replays the quote through create_sale's        │
//! │               commit inside the same tx that marks it converted         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! All validation happens before any write. A failure mid-commit rolls the
//! whole transaction back — sequence numbers included — so callers may
//! always resubmit after an error. There are no retries and no request
//! deduplication in this layer.

pub mod debt;
pub mod quotation;
pub mod sale;
pub mod stock;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::error::DbError;
use vendia_core::{CoreError, ValidationError};

// =============================================================================
// Ledger Error
// =============================================================================

/// Errors surfaced by ledger operations.
///
/// Domain failures (validation, preconditions, insufficient stock) arrive as
/// [`CoreError`]; infrastructure failures as [`DbError`]. Both propagate
/// unchanged so callers can match on the exact cause.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Core(err.into())
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Db(err.into())
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Ledger
// =============================================================================

/// The sale/stock/debt transaction engine.
///
/// Cheap to clone; holds only the pool handle. Obtain one through
/// [`crate::Database::ledger`].
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Creates a new Ledger over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Ledger { pool }
    }

    /// Returns the underlying pool (used by the operation submodules).
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// =============================================================================
// Shared Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use vendia_core::{Customer, Product, Supplier, TaxClass};

    /// Fresh in-memory database with one account, one customer, one supplier.
    pub(crate) async fn test_db() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let account = db.accounts().create("Test Shop", "INV", "QUO").await.unwrap();
        (db, account.id)
    }

    pub(crate) async fn seed_customer(db: &Database, account_id: i64) -> Customer {
        db.parties()
            .create_customer(account_id, "Ada Buyer", None, None)
            .await
            .unwrap()
    }

    pub(crate) async fn seed_supplier(db: &Database, account_id: i64) -> Supplier {
        db.parties()
            .create_supplier(account_id, "Acme Supply", None, None)
            .await
            .unwrap()
    }

    /// Creates a tracked product and stocks it to `stock` via the ledger.
    pub(crate) async fn seed_product(
        db: &Database,
        account_id: i64,
        sku: &str,
        unit_price_cents: i64,
        tax_class: TaxClass,
        stock: i64,
    ) -> Product {
        let product = db
            .products()
            .create(
                account_id,
                NewProduct {
                    sku: sku.to_string(),
                    name: format!("Product {}", sku),
                    unit_price_cents,
                    tax_class,
                    track_stock: true,
                    low_stock_threshold: None,
                },
            )
            .await
            .unwrap();

        if stock > 0 {
            db.ledger()
                .add_stock(account_id, product.id, stock, None, None, None)
                .await
                .unwrap();
        }

        db.products()
            .get(account_id, product.id)
            .await
            .unwrap()
            .unwrap()
    }
}
