//! # Domain Types
//!
//! Core domain types used throughout Vendia.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐             │
//! │  │    Product    │──►│ StockMovement │   │     Sale      │             │
//! │  │  stock: i64   │   │  append-only  │◄──│  + line items │             │
//! │  └───────────────┘   └───────────────┘   └──────┬────────┘             │
//! │                                                 │                      │
//! │  ┌───────────────┐   ┌───────────────┐   ┌──────▼────────┐             │
//! │  │   Quotation   │──►│  Receivable   │◄──│ SerialRecord  │             │
//! │  │  (converts)   │   │  / Payable    │   │  (snapshots)  │             │
//! │  └───────────────┘   └───────▲───────┘   └───────────────┘             │
//! │                              │                                         │
//! │                      ┌───────┴───────┐                                 │
//! │                      │  DebtPayment  │                                 │
//! │                      └───────────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a surrogate `i64` id (AUTOINCREMENT) and scoped
//! by an `account_id`. Status and kind fields are closed enums stored as
//! lowercase text, never free strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::tax::TaxClass;

// =============================================================================
// Movement Kind
// =============================================================================

/// The kind of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock received (purchase, return). Quantity is unsigned.
    In,
    /// Stock leaving (sale, loss). Quantity is unsigned.
    Out,
    /// Manual correction to an absolute level. Quantity is the signed delta.
    Adjustment,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale or a debt payment was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
    /// On credit: the sale creates a receivable instead of being settled.
    Credit,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// Sales are created completed; `Cancelled` exists as a terminal state but no
/// cancellation operation is part of the ledger flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Cancelled,
}

// =============================================================================
// Debt Status
// =============================================================================

/// The settlement status of a receivable or payable.
///
/// Only `Pending`, `Partial` and `Paid` are ever stored; `Overdue` is derived
/// at read time from the due date (see [`Receivable::status_as_of`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl DebtStatus {
    /// Recomputes the stored status from the paid fraction.
    ///
    /// Pure function of the amounts: `Paid` iff nothing remains, `Partial`
    /// iff something but not everything was paid, else `Pending`.
    ///
    /// ```rust
    /// use vendia_core::types::DebtStatus;
    ///
    /// assert_eq!(DebtStatus::from_amounts(0, 100_000), DebtStatus::Pending);
    /// assert_eq!(DebtStatus::from_amounts(60_000, 100_000), DebtStatus::Partial);
    /// assert_eq!(DebtStatus::from_amounts(100_000, 100_000), DebtStatus::Paid);
    /// ```
    pub fn from_amounts(paid_cents: i64, amount_cents: i64) -> Self {
        if amount_cents - paid_cents <= 0 {
            DebtStatus::Paid
        } else if paid_cents > 0 {
            DebtStatus::Partial
        } else {
            DebtStatus::Pending
        }
    }
}

// =============================================================================
// Quotation Status
// =============================================================================

/// The lifecycle of a quotation.
///
/// `Converted` is reachable only through document conversion, which also sets
/// `converted_sale_id` — the two always change together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
    Converted,
}

impl QuotationStatus {
    /// The lowercase name stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "draft",
            QuotationStatus::Sent => "sent",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Rejected => "rejected",
            QuotationStatus::Expired => "expired",
            QuotationStatus::Converted => "converted",
        }
    }
}

// =============================================================================
// Account
// =============================================================================

/// The owning account (tenant) and its document numbering configuration.
///
/// `next_sale_number` / `next_quotation_number` are consumed with an atomic
/// increment-and-fetch inside the committing transaction, never read-then-write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub sale_prefix: String,
    pub next_sale_number: i64,
    pub quotation_prefix: String,
    pub next_quotation_number: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Counterparties
// =============================================================================

/// A buyer. Referenced by sales, receivables and serial records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A vendor. Referenced by stock-in movements and payables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// The `stock` counter is mutated only by the Stock Ledger; everything else
/// is plain catalog data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub account_id: i64,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,
    pub name: String,

    /// Unit price in cents, TAX-INCLUSIVE.
    pub unit_price_cents: i64,
    pub tax_class: TaxClass,

    /// Current stock level. Meaningful only when `track_stock` is set.
    pub stock: i64,

    /// Whether the Stock Ledger controls this product.
    pub track_stock: bool,

    /// Stock level at or below which the product is reported as low.
    pub low_stock_threshold: Option<i64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the tax-inclusive unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Checks if the requested quantity can be taken from stock.
    ///
    /// Untracked products always pass; the ledger neither checks nor moves
    /// their counter.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        !self.track_stock || self.stock >= quantity
    }

    /// Checks if the product is at or below its low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        match self.low_stock_threshold {
            Some(threshold) if self.track_stock => self.stock <= threshold,
            _ => false,
        }
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One append-only record of a stock change.
///
/// Movements are never updated or deleted; the product counter is the running
/// sum the history explains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub account_id: i64,
    pub product_id: i64,

    /// Set for `in` movements sourced from a supplier.
    pub supplier_id: Option<i64>,

    /// Set for `out` movements caused by a sale.
    pub sale_id: Option<i64>,

    pub kind: MovementKind,

    /// Unsigned for `in`/`out`; the signed delta for `adjustment`.
    pub quantity: i64,

    /// Acquisition cost per unit, for `in` movements.
    pub unit_cost_cents: Option<i64>,

    pub reason: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable after creation except for status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub account_id: i64,
    pub customer_id: Option<i64>,

    /// Human-readable sequence number, e.g. `INV-000042`.
    pub number: String,

    pub sale_date: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLineItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    pub quantity: i64,

    /// Unit price in cents at time of sale (frozen, tax-inclusive).
    pub unit_price_cents: i64,

    /// Net amount of this line (gross with the tax share removed).
    pub subtotal_cents: i64,

    /// Absolute discount applied to this line's gross.
    pub discount_cents: i64,

    /// Whether serial numbers were recorded for this line.
    pub has_serial: bool,

    /// Warranty length in days; zero when no warranty applies.
    pub warranty_days: i64,
}

impl SaleLineItem {
    /// The tax-inclusive gross of this line after discount.
    #[inline]
    pub fn gross_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity - self.discount_cents
    }
}

// =============================================================================
// Serial Record
// =============================================================================

/// One physical serialized unit sold.
///
/// Product, customer and sale data are denormalized so the record stays
/// meaningful even if the source rows are later renamed or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SerialRecord {
    pub id: i64,
    pub account_id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub customer_id: Option<i64>,

    /// The unit's serial number as supplied at sale time.
    pub serial: String,

    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Customer name at time of sale (frozen), when the sale had one.
    pub customer_name: Option<String>,

    /// Sale sequence number at time of sale (frozen).
    pub sale_number: String,

    pub sold_at: DateTime<Utc>,
    pub warranty_days: i64,

    /// `sold_at + warranty_days`.
    pub warranty_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SerialRecord {
    /// Whether the warranty window covers the given instant.
    pub fn in_warranty(&self, now: DateTime<Utc>) -> bool {
        self.warranty_days > 0 && now <= self.warranty_until
    }
}

// =============================================================================
// Receivable / Payable
// =============================================================================

/// Money owed to the business by a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Receivable {
    pub id: i64,
    pub account_id: i64,
    pub customer_id: i64,

    /// The credit sale that originated this debt, when there is one.
    pub sale_id: Option<i64>,

    pub amount_cents: i64,
    pub paid_cents: i64,

    /// Invariant: `remaining_cents == amount_cents - paid_cents`.
    pub remaining_cents: i64,

    pub due_date: DateTime<Utc>,
    pub status: DebtStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receivable {
    /// Display status as of `now`: `Overdue` when past due and not paid.
    ///
    /// A read-time derivation; the stored status is never rewritten by the
    /// passage of time.
    pub fn status_as_of(&self, now: DateTime<Utc>) -> DebtStatus {
        derive_overdue(self.status, self.due_date, now)
    }
}

/// Money the business owes a supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payable {
    pub id: i64,
    pub account_id: i64,
    pub supplier_id: i64,

    /// Free-form origin reference (expense, purchase order).
    pub reference: Option<String>,

    pub amount_cents: i64,
    pub paid_cents: i64,
    pub remaining_cents: i64,
    pub due_date: DateTime<Utc>,
    pub status: DebtStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payable {
    /// Display status as of `now`: `Overdue` when past due and not paid.
    pub fn status_as_of(&self, now: DateTime<Utc>) -> DebtStatus {
        derive_overdue(self.status, self.due_date, now)
    }
}

fn derive_overdue(stored: DebtStatus, due: DateTime<Utc>, now: DateTime<Utc>) -> DebtStatus {
    if stored != DebtStatus::Paid && due < now {
        DebtStatus::Overdue
    } else {
        stored
    }
}

/// A payment applied against exactly one receivable or payable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DebtPayment {
    pub id: i64,
    pub account_id: i64,

    /// Exactly one of `receivable_id` / `payable_id` is set; a CHECK
    /// constraint backs the typed API.
    pub receivable_id: Option<i64>,
    pub payable_id: Option<i64>,

    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Quotation
// =============================================================================

/// A priced offer that can later be converted into a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Quotation {
    pub id: i64,
    pub account_id: i64,
    pub customer_id: Option<i64>,

    /// Human-readable sequence number, e.g. `QUO-000007`.
    pub number: String,

    pub quote_date: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: QuotationStatus,

    /// Set if and only if `status == Converted`.
    pub converted_sale_id: Option<i64>,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item in a quotation. Mirrors [`SaleLineItem`] structurally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct QuotationLineItem {
    pub id: i64,
    pub quotation_id: i64,
    pub product_id: i64,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub warranty_days: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_debt_status_from_amounts() {
        assert_eq!(DebtStatus::from_amounts(0, 100_000), DebtStatus::Pending);
        assert_eq!(DebtStatus::from_amounts(60_000, 100_000), DebtStatus::Partial);
        assert_eq!(DebtStatus::from_amounts(100_000, 100_000), DebtStatus::Paid);
        // Over-settlement still reads as paid; the ledger rejects it upstream.
        assert_eq!(DebtStatus::from_amounts(100_001, 100_000), DebtStatus::Paid);
        assert_eq!(DebtStatus::from_amounts(1, 100_000), DebtStatus::Partial);
    }

    fn receivable(status: DebtStatus, due: DateTime<Utc>) -> Receivable {
        Receivable {
            id: 1,
            account_id: 1,
            customer_id: 1,
            sale_id: None,
            amount_cents: 100_000,
            paid_cents: 0,
            remaining_cents: 100_000,
            due_date: due,
            status,
            created_at: due,
            updated_at: due,
        }
    }

    #[test]
    fn test_overdue_is_derived_at_read_time() {
        let now = Utc::now();
        let past_due = receivable(DebtStatus::Pending, now - Duration::days(3));
        assert_eq!(past_due.status_as_of(now), DebtStatus::Overdue);
        // The stored status is untouched.
        assert_eq!(past_due.status, DebtStatus::Pending);

        let not_due = receivable(DebtStatus::Pending, now + Duration::days(3));
        assert_eq!(not_due.status_as_of(now), DebtStatus::Pending);

        let paid = receivable(DebtStatus::Paid, now - Duration::days(3));
        assert_eq!(paid.status_as_of(now), DebtStatus::Paid);

        let partial = receivable(DebtStatus::Partial, now - Duration::days(1));
        assert_eq!(partial.status_as_of(now), DebtStatus::Overdue);
    }

    fn product(track: bool, stock: i64, threshold: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            account_id: 1,
            sku: "WID-001".to_string(),
            name: "Widget".to_string(),
            unit_price_cents: 11_900,
            tax_class: TaxClass::Rate19,
            stock,
            track_stock: track,
            low_stock_threshold: threshold,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_stock_checks() {
        let tracked = product(true, 5, None);
        assert!(tracked.has_stock_for(5));
        assert!(!tracked.has_stock_for(6));

        let untracked = product(false, 0, None);
        assert!(untracked.has_stock_for(1_000));
    }

    #[test]
    fn test_low_stock_threshold() {
        assert!(product(true, 3, Some(5)).is_low_stock());
        assert!(!product(true, 6, Some(5)).is_low_stock());
        // Threshold is meaningless for untracked products.
        assert!(!product(false, 0, Some(5)).is_low_stock());
        assert!(!product(true, 0, None).is_low_stock());
    }

    #[test]
    fn test_line_item_gross() {
        let line = SaleLineItem {
            id: 1,
            sale_id: 1,
            product_id: 1,
            name_snapshot: "Widget".to_string(),
            quantity: 3,
            unit_price_cents: 11_900,
            subtotal_cents: 30_000,
            discount_cents: 700,
            has_serial: false,
            warranty_days: 0,
        };
        assert_eq!(line.gross_cents(), 3 * 11_900 - 700);
    }

    #[test]
    fn test_serial_warranty_window() {
        let now = Utc::now();
        let record = SerialRecord {
            id: 1,
            account_id: 1,
            sale_id: 1,
            product_id: 1,
            customer_id: None,
            serial: "SN-0001".to_string(),
            product_name: "Widget".to_string(),
            customer_name: None,
            sale_number: "INV-000001".to_string(),
            sold_at: now - Duration::days(10),
            warranty_days: 30,
            warranty_until: now - Duration::days(10) + Duration::days(30),
            created_at: now,
        };
        assert!(record.in_warranty(now));
        assert!(!record.in_warranty(now + Duration::days(30)));
    }
}
