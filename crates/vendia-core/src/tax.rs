//! # Tax Engine
//!
//! Splits tax-inclusive line amounts into net + tax.
//!
//! ## Tax-Inclusive Prices
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog prices already CONTAIN the applicable tax.                     │
//! │                                                                         │
//! │  Line gross:  $119,000.00  (quantity × unit price, tax included)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  net = gross / (1 + rate)      ← division, never multiplication        │
//! │  tax = gross − net                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  net: $100,000.00   tax: $19,000.00   (at 19%)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Aggregation Rule
//! Nets and taxes are summed UNROUNDED across all lines and each aggregate is
//! rounded to cents once at the end. Rounding per line and then summing would
//! compound the error across large carts. The accumulator keeps milli-cents
//! (1/1000 of a cent) in i128, so the residual error is three decimal places
//! below the rounding unit.

use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Class
// =============================================================================

/// The tax treatment of a product.
///
/// A closed set: the persistence layer stores the lowercase name, so an
/// unknown class cannot enter the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TaxClass {
    /// Outside the tax system entirely (rate 0).
    Excluded,
    /// Inside the tax system but exempt (rate 0).
    Exempt,
    /// Reduced rate: 5%.
    Rate5,
    /// Standard rate: 19%.
    Rate19,
}

impl TaxClass {
    /// Returns the rate in basis points (1 bps = 0.01%).
    #[inline]
    pub const fn rate_bps(&self) -> i64 {
        match self {
            TaxClass::Excluded | TaxClass::Exempt => 0,
            TaxClass::Rate5 => 500,
            TaxClass::Rate19 => 1900,
        }
    }

    /// Checks whether this class carries a non-zero rate.
    #[inline]
    pub const fn is_taxed(&self) -> bool {
        self.rate_bps() > 0
    }
}

// =============================================================================
// Line Split
// =============================================================================

/// Splits a single tax-inclusive gross amount into `(net, tax)`, each rounded
/// to cents, with `net + tax == gross` exactly.
///
/// Used for the per-line snapshot stored on a sale line item. Aggregates must
/// go through [`TaxTotals`] instead so rounding happens once.
///
/// ```rust
/// use vendia_core::money::Money;
/// use vendia_core::tax::{split_line, TaxClass};
///
/// let (net, tax) = split_line(Money::from_cents(23_800_000), TaxClass::Rate19);
/// assert_eq!(net.cents(), 20_000_000);
/// assert_eq!(tax.cents(), 3_800_000);
/// ```
pub fn split_line(gross: Money, class: TaxClass) -> (Money, Money) {
    let net = Money::from_cents(round_millis_to_cents(net_millis(gross, class)));
    (net, gross - net)
}

/// Exact net of a tax-inclusive gross, in milli-cents.
fn net_millis(gross: Money, class: TaxClass) -> i128 {
    let rate = class.rate_bps() as i128;
    if rate == 0 {
        return gross.cents() as i128 * 1000;
    }
    // net = gross × 10000 / (10000 + rate), carried at 1/1000 cent
    div_half_up(gross.cents() as i128 * 1000 * 10_000, 10_000 + rate)
}

/// Integer division rounding half away from zero.
fn div_half_up(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);
    if num >= 0 {
        (2 * num + den) / (2 * den)
    } else {
        -((2 * -num + den) / (2 * den))
    }
}

/// Rounds a milli-cent amount to whole cents, half away from zero.
fn round_millis_to_cents(millis: i128) -> i64 {
    div_half_up(millis, 1000) as i64
}

// =============================================================================
// Aggregation
// =============================================================================

/// Accumulates unrounded net/tax across the lines of one document.
///
/// ## Usage
/// ```rust
/// use vendia_core::money::Money;
/// use vendia_core::tax::{TaxClass, TaxTotals};
///
/// let mut totals = TaxTotals::new();
/// totals.add_line(Money::from_cents(11_900), TaxClass::Rate19);
/// totals.add_line(Money::from_cents(5_000), TaxClass::Exempt);
///
/// let breakdown = totals.finish();
/// assert_eq!(breakdown.total.cents(), 16_900);
/// assert_eq!(breakdown.subtotal.cents(), 15_000);
/// assert_eq!(breakdown.tax.cents(), 1_900);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaxTotals {
    net_millis: i128,
    tax_millis: i128,
    gross_cents: i64,
}

impl TaxTotals {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        TaxTotals::default()
    }

    /// Adds one line's tax-inclusive gross amount.
    pub fn add_line(&mut self, gross: Money, class: TaxClass) {
        let net = net_millis(gross, class);
        self.net_millis += net;
        self.tax_millis += gross.cents() as i128 * 1000 - net;
        self.gross_cents += gross.cents();
    }

    /// Finishes aggregation, rounding each aggregate to cents exactly once.
    ///
    /// `total` is the exact gross sum; `subtotal + tax` may differ from it by
    /// at most one cent of independent-rounding slack.
    pub fn finish(self) -> TaxBreakdown {
        TaxBreakdown {
            subtotal: Money::from_cents(round_millis_to_cents(self.net_millis)),
            tax: Money::from_cents(round_millis_to_cents(self.tax_millis)),
            total: Money::from_cents(self.gross_cents),
        }
    }
}

/// The rounded totals of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Sum of line nets (`Σnet`), rounded once.
    pub subtotal: Money,
    /// Sum of line taxes (`Σtax`), rounded once.
    pub tax: Money,
    /// Sum of line grosses (`Σgross`), exact.
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_bps() {
        assert_eq!(TaxClass::Excluded.rate_bps(), 0);
        assert_eq!(TaxClass::Exempt.rate_bps(), 0);
        assert_eq!(TaxClass::Rate5.rate_bps(), 500);
        assert_eq!(TaxClass::Rate19.rate_bps(), 1900);
        assert!(TaxClass::Rate19.is_taxed());
        assert!(!TaxClass::Exempt.is_taxed());
    }

    /// Product priced 119,000.00 tax-inclusive at 19%, quantity 2:
    /// gross 238,000.00 → net 200,000.00, tax 38,000.00.
    #[test]
    fn test_standard_rate_split() {
        let gross = Money::from_cents(119_000_00).multiply_quantity(2);
        assert_eq!(gross.cents(), 238_000_00);

        let (net, tax) = split_line(gross, TaxClass::Rate19);
        assert_eq!(net.cents(), 200_000_00);
        assert_eq!(tax.cents(), 38_000_00);
        assert_eq!((net + tax).cents(), gross.cents());
    }

    #[test]
    fn test_reduced_rate_split() {
        // $105.00 at 5% → net $100.00, tax $5.00
        let (net, tax) = split_line(Money::from_cents(10_500), TaxClass::Rate5);
        assert_eq!(net.cents(), 10_000);
        assert_eq!(tax.cents(), 500);
    }

    #[test]
    fn test_zero_rate_split() {
        for class in [TaxClass::Excluded, TaxClass::Exempt] {
            let (net, tax) = split_line(Money::from_cents(12_345), class);
            assert_eq!(net.cents(), 12_345);
            assert_eq!(tax.cents(), 0);
        }
    }

    /// The net × (1 + rate) round-trip must land back on the gross.
    #[test]
    fn test_round_trip_within_tolerance() {
        for gross_cents in [999, 11_900, 238_000_00, 1_234_567] {
            let gross = Money::from_cents(gross_cents);
            let (net, _) = split_line(gross, TaxClass::Rate19);
            let reconstructed = net.cents() as i128 * 11_900 / 10_000;
            assert!(
                (reconstructed - gross_cents as i128).abs() <= 1,
                "gross {} reconstructed as {}",
                gross_cents,
                reconstructed
            );
        }
    }

    /// Aggregates round once at the end, not per line.
    #[test]
    fn test_aggregate_rounds_once() {
        // Each $10.00 line at 19% has net 840.336... cents. Summed unrounded,
        // two lines give 1680.67 → 1681; rounding per line would give 1680.
        let mut totals = TaxTotals::new();
        totals.add_line(Money::from_cents(1000), TaxClass::Rate19);
        totals.add_line(Money::from_cents(1000), TaxClass::Rate19);
        let breakdown = totals.finish();

        assert_eq!(breakdown.total.cents(), 2000);
        assert_eq!(breakdown.subtotal.cents(), 1681);
        assert_eq!(breakdown.tax.cents(), 319);
        assert_eq!(
            breakdown.subtotal.cents() + breakdown.tax.cents(),
            breakdown.total.cents()
        );
    }

    #[test]
    fn test_mixed_classes_aggregate() {
        let mut totals = TaxTotals::new();
        totals.add_line(Money::from_cents(11_900), TaxClass::Rate19);
        totals.add_line(Money::from_cents(10_500), TaxClass::Rate5);
        totals.add_line(Money::from_cents(3_000), TaxClass::Excluded);
        let breakdown = totals.finish();

        assert_eq!(breakdown.subtotal.cents(), 10_000 + 10_000 + 3_000);
        assert_eq!(breakdown.tax.cents(), 1_900 + 500);
        assert_eq!(breakdown.total.cents(), 25_400);
    }

    #[test]
    fn test_subtotal_plus_tax_within_one_cent_of_total() {
        // Awkward amounts where both aggregates round the same way.
        let mut totals = TaxTotals::new();
        for gross in [333, 777, 1001, 49_999] {
            totals.add_line(Money::from_cents(gross), TaxClass::Rate19);
        }
        let b = totals.finish();
        let slack = (b.subtotal.cents() + b.tax.cents() - b.total.cents()).abs();
        assert!(slack <= 1, "slack was {} cents", slack);
    }

    #[test]
    fn test_empty_accumulator() {
        let b = TaxTotals::new().finish();
        assert!(b.subtotal.is_zero());
        assert!(b.tax.is_zero());
        assert!(b.total.is_zero());
    }
}
