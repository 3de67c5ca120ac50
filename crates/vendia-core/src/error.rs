//! # Error Types
//!
//! Domain-specific error types for vendia-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vendia-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule / precondition failures           │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  vendia-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                     │
//! │  └── LedgerError      - CoreError | DbError at the service seam         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (id, amounts, etc.)
//! 3. Errors are enum variants, never String
//!
//! Uniqueness conflicts (duplicate SKU, duplicate number) surface as
//! `DbError::UniqueViolation` from the persistence layer; they have no
//! counterpart here because the core never detects them itself.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations or failed preconditions. Every
/// variant is raised BEFORE any write, so a caller receiving one can resubmit
/// safely.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced product does not exist in the account.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Referenced customer does not exist in the account.
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    /// Referenced supplier does not exist in the account.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(i64),

    /// Referenced sale does not exist in the account.
    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// Referenced quotation does not exist in the account.
    #[error("Quotation not found: {0}")]
    QuotationNotFound(i64),

    /// Referenced receivable does not exist in the account.
    #[error("Receivable not found: {0}")]
    ReceivableNotFound(i64),

    /// Referenced payable does not exist in the account.
    #[error("Payable not found: {0}")]
    PayableNotFound(i64),

    /// Owning account row is missing.
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    /// Insufficient stock to complete the operation.
    ///
    /// Carries what was available against what was requested so the caller
    /// can display the shortfall.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A credit sale needs a customer to owe the money.
    #[error("Credit sale requires a customer reference")]
    CreditSaleRequiresCustomer,

    /// A credit sale needs a positive credit term to compute the due date.
    #[error("Credit sale requires a positive credit-days term")]
    CreditSaleRequiresTerm,

    /// Only accepted quotations can be converted into sales.
    #[error("Quotation {quotation_id} is {status}, only accepted quotations convert")]
    QuotationNotAccepted { quotation_id: i64, status: String },

    /// A debt payment may not exceed what remains.
    #[error("Payment of {requested_cents} exceeds remaining balance {remaining_cents}")]
    Overpayment {
        remaining_cents: i64,
        requested_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements and are raised
/// before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A sale needs at least one line.
    #[error("cart must contain at least one line")]
    EmptyCart,

    /// A serialized line must supply exactly one serial per unit.
    #[error("serial count mismatch: quantity {expected}, serials supplied {supplied}")]
    SerialCountMismatch { expected: i64, supplied: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Widget".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Widget: available 3, requested 5"
        );

        let err = CoreError::Overpayment {
            remaining_cents: 40_000,
            requested_cents: 50_000,
        };
        assert_eq!(
            err.to_string(),
            "Payment of 50000 exceeds remaining balance 40000"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "reason".to_string(),
        };
        assert_eq!(err.to_string(), "reason is required");

        let err = ValidationError::SerialCountMismatch {
            expected: 2,
            supplied: 1,
        };
        assert_eq!(
            err.to_string(),
            "serial count mismatch: quantity 2, serials supplied 1"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptyCart;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
