//! # vendia-db: Database Layer for Vendia
//!
//! This crate provides database access for the Vendia backend.
//! It uses SQLite for local storage with sqlx for async operations, and
//! hosts the sale transaction engine on top of the repositories.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vendia Data Flow                                 │
//! │                                                                         │
//! │  Caller (API / app layer)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vendia-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │    Ledger     │──►│ Repositories  │   │  Migrations   │    │   │
//! │  │   │ (ledger/*.rs) │   │(repository/*) │   │  (embedded)   │    │   │
//! │  │   │               │   │               │   │               │    │   │
//! │  │   │ create_sale   │   │ ProductRepo   │   │ 001_init.sql  │    │   │
//! │  │   │ convert_quote │   │ StockRepo     │   │ ...           │    │   │
//! │  │   │ one tx each   │   │ DebtRepo ...  │   │               │    │   │
//! │  │   └───────────────┘   └───────┬───────┘   └───────────────┘    │   │
//! │  │                               │                                │   │
//! │  └───────────────────────────────┼────────────────────────────────┘   │
//! │                                  ▼                                     │
//! │                          SQLite Database                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, stock, debt, etc.)
//! - [`ledger`] - The sale transaction engine and document conversion
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vendia_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/db.sqlite")).await?;
//!
//! // Repositories for single-entity operations
//! db.stock().add_stock(account_id, product_id, 10, None, None, None).await?;
//!
//! // The ledger for the all-or-nothing sale flow
//! let sale = db.ledger().create_sale(account_id, request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use ledger::{Ledger, LedgerError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::account::AccountRepository;
pub use repository::debt::{DebtRef, DebtRepository};
pub use repository::party::PartyRepository;
pub use repository::product::ProductRepository;
pub use repository::quotation::QuotationRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockRepository;
