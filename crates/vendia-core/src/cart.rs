//! # Cart Module
//!
//! Validated value objects for the sale creation boundary.
//!
//! ## Why Value Objects?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The cart payload crosses a trust boundary. Instead of a loose map      │
//! │  of values, each line is a typed object validated BEFORE the ledger     │
//! │  engine runs:                                                           │
//! │                                                                         │
//! │  CartLine { product_id, quantity, serials, ... }                        │
//! │       │                                                                 │
//! │       ▼  validate()                                                     │
//! │  quantity positive & bounded, serials match quantity,                   │
//! │  discount non-negative, warranty non-negative                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CreateSale::validate() — cart non-empty, credit preconditions          │
//! │                                                                         │
//! │  Only validated requests reach the transaction engine.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::PaymentMethod;
use crate::validation::{
    validate_credit_days, validate_discount_cents, validate_price_cents, validate_quantity,
    validate_serials, validate_warranty_days,
};
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a sale request.
///
/// ## Price Freezing
/// `unit_price_cents` is `None` for an ordinary sale (the product's current
/// price applies at commit time) and `Some` when a price was frozen earlier,
/// e.g. replaying a quotation at its quoted price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product reference.
    pub product_id: i64,

    /// Units sold. Positive, bounded by [`crate::MAX_LINE_QUANTITY`].
    pub quantity: i64,

    /// Frozen unit price in cents; `None` uses the product's current price.
    pub unit_price_cents: Option<i64>,

    /// Absolute discount off this line's gross, in cents.
    pub discount_cents: i64,

    /// Whether this line records serial numbers.
    pub has_serial: bool,

    /// One serial per physical unit when `has_serial` is set.
    pub serials: Vec<String>,

    /// Warranty length in days; zero means no warranty.
    pub warranty_days: i64,
}

impl CartLine {
    /// Creates a plain line: current price, no discount, no serials.
    pub fn new(product_id: i64, quantity: i64) -> Self {
        CartLine {
            product_id,
            quantity,
            unit_price_cents: None,
            discount_cents: 0,
            has_serial: false,
            serials: Vec::new(),
            warranty_days: 0,
        }
    }

    /// Freezes the unit price for this line.
    pub fn priced_at(mut self, unit_price_cents: i64) -> Self {
        self.unit_price_cents = Some(unit_price_cents);
        self
    }

    /// Applies an absolute discount to this line.
    pub fn with_discount(mut self, discount_cents: i64) -> Self {
        self.discount_cents = discount_cents;
        self
    }

    /// Marks the line as serialized and records the unit serials.
    pub fn with_serials(mut self, serials: Vec<String>) -> Self {
        self.has_serial = true;
        self.serials = serials;
        self
    }

    /// Sets the warranty window for the sold units.
    pub fn with_warranty(mut self, warranty_days: i64) -> Self {
        self.warranty_days = warranty_days;
        self
    }

    /// Validates this line in isolation.
    pub fn validate(&self) -> CoreResult<()> {
        validate_quantity(self.quantity)?;
        validate_discount_cents(self.discount_cents)?;
        validate_warranty_days(self.warranty_days)?;

        if let Some(price) = self.unit_price_cents {
            validate_price_cents(price)?;
        }

        if self.has_serial {
            validate_serials(self.quantity, &self.serials)?;
        } else if !self.serials.is_empty() {
            // Serials without the flag means the caller built the line wrong.
            return Err(crate::error::ValidationError::SerialCountMismatch {
                expected: 0,
                supplied: self.serials.len(),
            }
            .into());
        }

        Ok(())
    }
}

// =============================================================================
// Create Sale Request
// =============================================================================

/// A validated request to turn a cart into a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSale {
    /// Buyer; required for credit sales, optional otherwise.
    pub customer_id: Option<i64>,

    pub payment_method: PaymentMethod,

    /// Credit term in days; required and positive for credit sales.
    pub credit_days: Option<i64>,

    pub notes: Option<String>,

    pub lines: Vec<CartLine>,
}

impl CreateSale {
    /// Creates a request with no customer and no credit term.
    pub fn new(payment_method: PaymentMethod, lines: Vec<CartLine>) -> Self {
        CreateSale {
            customer_id: None,
            payment_method,
            credit_days: None,
            notes: None,
            lines,
        }
    }

    /// Attaches the buyer.
    pub fn for_customer(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Sets the credit term in days.
    pub fn with_credit_days(mut self, days: i64) -> Self {
        self.credit_days = Some(days);
        self
    }

    /// Attaches free-form notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Validates the whole request before any database work.
    ///
    /// Checks, in order: cart non-empty and bounded, every line well-formed,
    /// and — for credit sales — that a customer and a positive credit term
    /// are present. Any failure here guarantees zero side effects.
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.is_empty() {
            return Err(crate::error::ValidationError::EmptyCart.into());
        }

        if self.lines.len() > MAX_CART_LINES {
            return Err(crate::error::ValidationError::OutOfRange {
                field: "cart lines".to_string(),
                min: 1,
                max: MAX_CART_LINES as i64,
            }
            .into());
        }

        for line in &self.lines {
            line.validate()?;
        }

        if self.payment_method == PaymentMethod::Credit {
            if self.customer_id.is_none() {
                return Err(CoreError::CreditSaleRequiresCustomer);
            }
            match self.credit_days {
                None => return Err(CoreError::CreditSaleRequiresTerm),
                Some(days) => validate_credit_days(days)?,
            }
        }

        Ok(())
    }
}

// =============================================================================
// Create Quotation Request
// =============================================================================

/// A validated request to create a quotation.
///
/// Structurally a cart plus a validity date. Quotation lines carry no
/// serials — physical units are picked at sale time, not quote time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuotation {
    pub customer_id: Option<i64>,

    /// Until when the offer stands.
    pub valid_until: DateTime<Utc>,

    pub notes: Option<String>,

    pub lines: Vec<CartLine>,
}

impl CreateQuotation {
    /// Creates a request with no customer.
    pub fn new(valid_until: DateTime<Utc>, lines: Vec<CartLine>) -> Self {
        CreateQuotation {
            customer_id: None,
            valid_until,
            notes: None,
            lines,
        }
    }

    /// Attaches the prospective buyer.
    pub fn for_customer(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Attaches free-form notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Validates the whole request before any database work.
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.is_empty() {
            return Err(crate::error::ValidationError::EmptyCart.into());
        }

        if self.lines.len() > MAX_CART_LINES {
            return Err(crate::error::ValidationError::OutOfRange {
                field: "cart lines".to_string(),
                min: 1,
                max: MAX_CART_LINES as i64,
            }
            .into());
        }

        for line in &self.lines {
            line.validate()?;

            if line.has_serial {
                return Err(crate::error::ValidationError::InvalidFormat {
                    field: "serials".to_string(),
                    reason: "serials are recorded at sale time, not on quotations".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_validates() {
        assert!(CartLine::new(1, 2).validate().is_ok());
    }

    #[test]
    fn test_bad_quantity_rejected() {
        assert!(CartLine::new(1, 0).validate().is_err());
        assert!(CartLine::new(1, -3).validate().is_err());
        assert!(CartLine::new(1, 1000).validate().is_err());
    }

    #[test]
    fn test_serial_count_must_match_quantity() {
        let ok = CartLine::new(1, 2).with_serials(vec!["A1".into(), "A2".into()]);
        assert!(ok.validate().is_ok());

        let short = CartLine::new(1, 2).with_serials(vec!["A1".into()]);
        assert!(short.validate().is_err());

        // Serials supplied without the flag are rejected too.
        let mut sneaky = CartLine::new(1, 1);
        sneaky.serials = vec!["A1".into()];
        assert!(sneaky.validate().is_err());
    }

    #[test]
    fn test_negative_discount_rejected() {
        assert!(CartLine::new(1, 1).with_discount(-50).validate().is_err());
        assert!(CartLine::new(1, 1).with_discount(0).validate().is_ok());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let req = CreateSale::new(PaymentMethod::Cash, vec![]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_credit_sale_requires_customer_and_term() {
        let lines = vec![CartLine::new(1, 1)];

        let no_customer = CreateSale::new(PaymentMethod::Credit, lines.clone()).with_credit_days(30);
        assert!(matches!(
            no_customer.validate(),
            Err(CoreError::CreditSaleRequiresCustomer)
        ));

        let no_term = CreateSale::new(PaymentMethod::Credit, lines.clone()).for_customer(7);
        assert!(matches!(
            no_term.validate(),
            Err(CoreError::CreditSaleRequiresTerm)
        ));

        let zero_term = CreateSale::new(PaymentMethod::Credit, lines.clone())
            .for_customer(7)
            .with_credit_days(0);
        assert!(zero_term.validate().is_err());

        let complete = CreateSale::new(PaymentMethod::Credit, lines)
            .for_customer(7)
            .with_credit_days(30);
        assert!(complete.validate().is_ok());
    }

    #[test]
    fn test_cash_sale_needs_no_credit_fields() {
        let req = CreateSale::new(PaymentMethod::Cash, vec![CartLine::new(1, 1)]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_quotation_rejects_serialized_lines() {
        let valid_until = Utc::now();

        let plain = CreateQuotation::new(valid_until, vec![CartLine::new(1, 2)]);
        assert!(plain.validate().is_ok());

        let serialized = CreateQuotation::new(
            valid_until,
            vec![CartLine::new(1, 1).with_serials(vec!["A1".into()])],
        );
        assert!(serialized.validate().is_err());

        let empty = CreateQuotation::new(valid_until, vec![]);
        assert!(empty.validate().is_err());
    }
}
