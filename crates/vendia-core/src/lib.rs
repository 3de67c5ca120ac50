//! # vendia-core: Pure Business Logic for Vendia
//!
//! This crate is the **heart** of Vendia. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vendia Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Caller (API / app layer)                        │   │
//! │  │    create_sale, add_stock, add_payment, convert_quotation       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vendia-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │money / tax│  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ CartLine  │  │   rules   │  │   │
//! │  │   │   Sale    │  │ TaxTotals │  │CreateSale │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vendia-db (Database Layer)                   │   │
//! │  │        SQLite queries, migrations, repositories, ledger         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Receivable, Quotation, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`tax`] - Tax classes and the tax-inclusive price splitter
//! - [`cart`] - Cart line value objects validated at the boundary
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use vendia_core::money::Money;
//! use vendia_core::tax::{TaxClass, TaxTotals};
//!
//! // A tax-inclusive line: 2 × $119,000.00 at 19%
//! let mut totals = TaxTotals::new();
//! totals.add_line(Money::from_cents(23_800_000), TaxClass::Rate19);
//! let breakdown = totals.finish();
//!
//! assert_eq!(breakdown.subtotal.cents(), 20_000_000); // $200,000.00 net
//! assert_eq!(breakdown.tax.cents(), 3_800_000);       // $38,000.00 tax
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vendia_core::Money` instead of
// `use vendia_core::money::Money`

pub use cart::{CartLine, CreateQuotation, CreateSale};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use tax::{TaxClass, TaxTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default account ID for single-account deployments.
///
/// The schema is account-scoped throughout; a single-shop install simply
/// operates on this one account row.
pub const DEFAULT_ACCOUNT_ID: i64 = 1;

/// Maximum lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
