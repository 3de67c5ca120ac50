//! # Validation Module
//!
//! Input validation utilities for Vendia.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (API boundary)                                         │
//! │  ├── Type validation (deserialization)                                  │
//! │  └── THIS MODULE: business rule validation                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger engine                                                 │
//! │  ├── Existence checks against the database                              │
//! │  └── Stock / precondition checks                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                              │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product or counterparty name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates the reason attached to a stock movement.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    if reason.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line or movement quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// Zero is allowed (free items); negatives are not.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount in cents.
pub fn validate_discount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "discount".to_string(),
        });
    }

    Ok(())
}

/// Validates a payment amount in cents.
///
/// Cannot pay zero or negative amounts.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a credit term in days.
pub fn validate_credit_days(days: i64) -> ValidationResult<()> {
    if days <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "credit days".to_string(),
        });
    }

    Ok(())
}

/// Validates a warranty length in days. Zero means no warranty.
pub fn validate_warranty_days(days: i64) -> ValidationResult<()> {
    if days < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "warranty days".to_string(),
        });
    }

    Ok(())
}

/// Validates the absolute stock level of an adjustment.
///
/// An adjustment may lower stock but never below zero.
pub fn validate_new_stock(new_stock: i64) -> ValidationResult<()> {
    if new_stock < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "new stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Serial Validators
// =============================================================================

/// Validates the serial list of a serialized line.
///
/// ## Rules
/// - One serial per physical unit: `serials.len() == quantity`
/// - No serial may be blank
pub fn validate_serials(quantity: i64, serials: &[String]) -> ValidationResult<()> {
    if serials.len() as i64 != quantity {
        return Err(ValidationError::SerialCountMismatch {
            expected: quantity,
            supplied: serials.len(),
        });
    }

    if serials.iter().any(|s| s.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "serial".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("WID-001").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Widget 330ml").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());

        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());

        assert!(validate_discount_cents(0).is_ok());
        assert!(validate_discount_cents(-1).is_err());
    }

    #[test]
    fn test_validate_credit_and_warranty_days() {
        assert!(validate_credit_days(30).is_ok());
        assert!(validate_credit_days(0).is_err());
        assert!(validate_credit_days(-5).is_err());

        assert!(validate_warranty_days(0).is_ok());
        assert!(validate_warranty_days(365).is_ok());
        assert!(validate_warranty_days(-1).is_err());
    }

    #[test]
    fn test_validate_new_stock() {
        assert!(validate_new_stock(0).is_ok());
        assert!(validate_new_stock(10).is_ok());
        assert!(validate_new_stock(-1).is_err());
    }

    #[test]
    fn test_validate_serials() {
        let serials = vec!["SN-1".to_string(), "SN-2".to_string()];
        assert!(validate_serials(2, &serials).is_ok());
        assert!(validate_serials(3, &serials).is_err());
        assert!(validate_serials(1, &serials).is_err());

        let blank = vec!["SN-1".to_string(), "  ".to_string()];
        assert!(validate_serials(2, &blank).is_err());
    }
}
