//! # Quotation Operations
//!
//! Creating quotations and converting accepted ones into sales.
//!
//! ## Conversion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  convert_quotation(id, payment_method, credit_days?)                    │
//! │       │                                                                 │
//! │       ├── quotation missing      → QuotationNotFound                    │
//! │       ├── status != accepted     → QuotationNotAccepted                 │
//! │       │                                                                 │
//! │       ▼  one transaction                                                │
//! │  rebuild cart from the quote lines (quoted price, discount, warranty)   │
//! │  run it through the SAME sale commit as create_sale                     │
//! │  mark the quotation converted + record the sale id                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  A stock shortfall (or any other failure) rolls everything back:        │
//! │  the quotation stays accepted and can be converted again later.        │
//! │                                                                         │
//! │  The quotation's own lines and totals are never touched.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;

use crate::ledger::sale::commit_sale;
use crate::ledger::{Ledger, LedgerResult};
use crate::repository::account::AccountRepository;
use crate::repository::party::PartyRepository;
use crate::repository::product::ProductRepository;
use crate::repository::quotation::QuotationRepository;
use vendia_core::tax::split_line;
use vendia_core::{
    CartLine, CoreError, CreateQuotation, CreateSale, Money, PaymentMethod, Quotation,
    QuotationLineItem, QuotationStatus, Sale, TaxTotals, ValidationError,
};

impl Ledger {
    /// Creates a draft quotation: prices the cart the same way a sale would
    /// and freezes product names and unit prices onto the quote lines.
    /// No stock is checked or moved.
    pub async fn create_quotation(
        &self,
        account_id: i64,
        request: CreateQuotation,
    ) -> LedgerResult<Quotation> {
        request.validate()?;

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        if let Some(customer_id) = request.customer_id {
            PartyRepository::get_customer_tx(&mut tx, account_id, customer_id)
                .await?
                .ok_or(CoreError::CustomerNotFound(customer_id))?;
        }

        // Price the lines; freeze name and unit price per line.
        let mut totals = TaxTotals::new();
        let mut discount_cents = 0i64;
        let mut items: Vec<QuotationLineItem> = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            let product = ProductRepository::get_tx(&mut tx, account_id, line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or(CoreError::ProductNotFound(line.product_id))?;

            let unit_price_cents = line.unit_price_cents.unwrap_or(product.unit_price_cents);
            let gross_cents = unit_price_cents * line.quantity - line.discount_cents;
            if gross_cents < 0 {
                return Err(ValidationError::MustBeNonNegative {
                    field: "line total".to_string(),
                }
                .into());
            }

            let gross = Money::from_cents(gross_cents);
            totals.add_line(gross, product.tax_class);
            let (net, _) = split_line(gross, product.tax_class);

            discount_cents += line.discount_cents;
            items.push(QuotationLineItem {
                id: 0,
                quotation_id: 0,
                product_id: product.id,
                name_snapshot: product.name,
                quantity: line.quantity,
                unit_price_cents,
                subtotal_cents: net.cents(),
                discount_cents: line.discount_cents,
                warranty_days: line.warranty_days,
            });
        }

        let breakdown = totals.finish();

        let number = AccountRepository::take_quotation_number(&mut tx, account_id)
            .await?
            .ok_or(CoreError::AccountNotFound(account_id))?;

        let mut quotation = Quotation {
            id: 0,
            account_id,
            customer_id: request.customer_id,
            number,
            quote_date: now,
            valid_until: request.valid_until,
            subtotal_cents: breakdown.subtotal.cents(),
            tax_cents: breakdown.tax.cents(),
            discount_cents,
            total_cents: breakdown.total.cents(),
            status: QuotationStatus::Draft,
            converted_sale_id: None,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        quotation.id = QuotationRepository::insert_quotation_tx(&mut tx, &quotation).await?;

        for item in &mut items {
            item.quotation_id = quotation.id;
            item.id = QuotationRepository::insert_item_tx(&mut tx, item).await?;
        }

        tx.commit().await?;

        info!(
            account_id,
            quotation_id = quotation.id,
            number = %quotation.number,
            total_cents = quotation.total_cents,
            "Quotation created"
        );

        Ok(quotation)
    }

    /// Converts an accepted quotation into a sale.
    ///
    /// Replays the quote lines — quoted price, discount, warranty — through
    /// the sale transaction engine, then marks the quotation converted in
    /// the same transaction. The quotation's stored lines and totals are
    /// never mutated.
    pub async fn convert_quotation(
        &self,
        account_id: i64,
        quotation_id: i64,
        payment_method: PaymentMethod,
        credit_days: Option<i64>,
    ) -> LedgerResult<Sale> {
        let mut tx = self.pool().begin().await?;

        let quotation = QuotationRepository::get_tx(&mut tx, account_id, quotation_id)
            .await?
            .ok_or(CoreError::QuotationNotFound(quotation_id))?;

        if quotation.status != QuotationStatus::Accepted {
            return Err(CoreError::QuotationNotAccepted {
                quotation_id,
                status: quotation.status.as_str().to_string(),
            }
            .into());
        }

        let items = QuotationRepository::get_items_tx(&mut tx, quotation_id).await?;

        let lines: Vec<CartLine> = items
            .iter()
            .map(|item| {
                CartLine::new(item.product_id, item.quantity)
                    .priced_at(item.unit_price_cents)
                    .with_discount(item.discount_cents)
                    .with_warranty(item.warranty_days)
            })
            .collect();

        let mut request = CreateSale::new(payment_method, lines);
        request.customer_id = quotation.customer_id;
        request.credit_days = credit_days;
        request.notes = Some(format!("Converted from quotation {}", quotation.number));

        request.validate()?;

        let sale = commit_sale(&mut tx, account_id, &request).await?;
        QuotationRepository::mark_converted_tx(&mut tx, account_id, quotation_id, sale.id).await?;

        tx.commit().await?;

        info!(
            account_id,
            quotation_id,
            sale_id = sale.id,
            sale_number = %sale.number,
            "Quotation converted"
        );

        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::ledger::testutil::{seed_customer, seed_product, test_db};
    use crate::ledger::LedgerError;
    use chrono::{Duration, Utc};
    use vendia_core::{
        CartLine, CoreError, CreateQuotation, DebtStatus, PaymentMethod, QuotationStatus, TaxClass,
    };

    #[tokio::test]
    async fn test_create_quotation_prices_without_stock_effects() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;
        let product =
            seed_product(&db, account_id, "TV-55", 119_000_00, TaxClass::Rate19, 3).await;

        let request = CreateQuotation::new(
            Utc::now() + Duration::days(15),
            vec![CartLine::new(product.id, 2)],
        )
        .for_customer(customer.id);

        let quotation = db.ledger().create_quotation(account_id, request).await.unwrap();

        assert_eq!(quotation.number, "QUO-000001");
        assert_eq!(quotation.status, QuotationStatus::Draft);
        assert_eq!(quotation.total_cents, 238_000_00);
        assert_eq!(quotation.subtotal_cents, 200_000_00);
        assert_eq!(quotation.tax_cents, 38_000_00);
        assert_eq!(quotation.converted_sale_id, None);

        let items = db.quotations().get_items(quotation.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 119_000_00);
        assert_eq!(items[0].name_snapshot, product.name);

        // Quoting moves no stock.
        let product = db.products().get(account_id, product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_convert_accepted_quotation_at_quoted_price() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;
        let mut product =
            seed_product(&db, account_id, "TV-55", 119_000_00, TaxClass::Rate19, 5).await;

        let request = CreateQuotation::new(
            Utc::now() + Duration::days(15),
            vec![CartLine::new(product.id, 2)],
        )
        .for_customer(customer.id);
        let quotation = db.ledger().create_quotation(account_id, request).await.unwrap();

        db.quotations()
            .set_status(account_id, quotation.id, QuotationStatus::Accepted)
            .await
            .unwrap();

        // Price hike between quote and conversion: the quote price stands.
        product.unit_price_cents = 129_000_00;
        db.products().update_details(&product).await.unwrap();

        let sale = db
            .ledger()
            .convert_quotation(account_id, quotation.id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 238_000_00);
        assert_eq!(sale.customer_id, Some(customer.id));

        let items = db.sales().get_items(sale.id).await.unwrap();
        assert_eq!(items[0].unit_price_cents, 119_000_00);

        // Stock moved through the ordinary sale path.
        let product = db.products().get(account_id, product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);
        assert_eq!(db.stock().movements_for_sale(sale.id).await.unwrap().len(), 1);

        // The quotation is terminal and untouched otherwise.
        let quotation = db.quotations().get(account_id, quotation.id).await.unwrap().unwrap();
        assert_eq!(quotation.status, QuotationStatus::Converted);
        assert_eq!(quotation.converted_sale_id, Some(sale.id));
        assert_eq!(quotation.total_cents, 238_000_00);
        assert_eq!(quotation.subtotal_cents, 200_000_00);
    }

    #[tokio::test]
    async fn test_convert_requires_accepted_status() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 10_000, TaxClass::Rate19, 5).await;

        let request = CreateQuotation::new(
            Utc::now() + Duration::days(15),
            vec![CartLine::new(product.id, 1)],
        );
        let quotation = db.ledger().create_quotation(account_id, request).await.unwrap();

        // Still draft: conversion is refused and nothing is written.
        let err = db
            .ledger()
            .convert_quotation(account_id, quotation.id, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        match err {
            LedgerError::Core(CoreError::QuotationNotAccepted { status, .. }) => {
                assert_eq!(status, "draft");
            }
            other => panic!("expected QuotationNotAccepted, got {other:?}"),
        }

        assert!(db.sales().list_recent(account_id, 10).await.unwrap().is_empty());
        let product = db.products().get(account_id, product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);

        assert!(matches!(
            db.ledger()
                .convert_quotation(account_id, 9999, PaymentMethod::Cash, None)
                .await
                .unwrap_err(),
            LedgerError::Core(CoreError::QuotationNotFound(9999))
        ));
    }

    #[tokio::test]
    async fn test_converted_quotation_is_terminal() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 10_000, TaxClass::Rate19, 5).await;

        let request = CreateQuotation::new(
            Utc::now() + Duration::days(15),
            vec![CartLine::new(product.id, 1)],
        );
        let quotation = db.ledger().create_quotation(account_id, request).await.unwrap();
        db.quotations()
            .set_status(account_id, quotation.id, QuotationStatus::Accepted)
            .await
            .unwrap();
        db.ledger()
            .convert_quotation(account_id, quotation.id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        // Converting again is refused.
        assert!(matches!(
            db.ledger()
                .convert_quotation(account_id, quotation.id, PaymentMethod::Cash, None)
                .await
                .unwrap_err(),
            LedgerError::Core(CoreError::QuotationNotAccepted { .. })
        ));

        // And no status update can leave (or re-enter) 'converted'.
        assert!(db
            .quotations()
            .set_status(account_id, quotation.id, QuotationStatus::Draft)
            .await
            .is_err());
        assert!(db
            .quotations()
            .set_status(account_id, quotation.id, QuotationStatus::Converted)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_credit_conversion_creates_receivable() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;
        let product = seed_product(&db, account_id, "WID-001", 50_000, TaxClass::Exempt, 5).await;

        let request = CreateQuotation::new(
            Utc::now() + Duration::days(15),
            vec![CartLine::new(product.id, 1)],
        )
        .for_customer(customer.id);
        let quotation = db.ledger().create_quotation(account_id, request).await.unwrap();
        db.quotations()
            .set_status(account_id, quotation.id, QuotationStatus::Accepted)
            .await
            .unwrap();

        let sale = db
            .ledger()
            .convert_quotation(account_id, quotation.id, PaymentMethod::Credit, Some(45))
            .await
            .unwrap();

        let receivables = db.debts().list_open_receivables(account_id).await.unwrap();
        assert_eq!(receivables.len(), 1);
        assert_eq!(receivables[0].sale_id, Some(sale.id));
        assert_eq!(receivables[0].amount_cents, 50_000);
        assert_eq!(receivables[0].status, DebtStatus::Pending);

        // A quotation without a customer cannot convert on credit.
        let request = CreateQuotation::new(
            Utc::now() + Duration::days(15),
            vec![CartLine::new(product.id, 1)],
        );
        let anonymous = db.ledger().create_quotation(account_id, request).await.unwrap();
        db.quotations()
            .set_status(account_id, anonymous.id, QuotationStatus::Accepted)
            .await
            .unwrap();
        assert!(matches!(
            db.ledger()
                .convert_quotation(account_id, anonymous.id, PaymentMethod::Credit, Some(30))
                .await
                .unwrap_err(),
            LedgerError::Core(CoreError::CreditSaleRequiresCustomer)
        ));
    }

    /// A stock shortfall mid-conversion rolls the whole transaction back:
    /// no sale, no movements, and the quotation stays accepted.
    #[tokio::test]
    async fn test_failed_conversion_leaves_quotation_accepted() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 10_000, TaxClass::Rate19, 1).await;

        let request = CreateQuotation::new(
            Utc::now() + Duration::days(15),
            vec![CartLine::new(product.id, 3)],
        );
        let quotation = db.ledger().create_quotation(account_id, request).await.unwrap();
        db.quotations()
            .set_status(account_id, quotation.id, QuotationStatus::Accepted)
            .await
            .unwrap();

        let err = db
            .ledger()
            .convert_quotation(account_id, quotation.id, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock { .. })
        ));

        let quotation = db.quotations().get(account_id, quotation.id).await.unwrap().unwrap();
        assert_eq!(quotation.status, QuotationStatus::Accepted);
        assert_eq!(quotation.converted_sale_id, None);
        assert!(db.sales().list_recent(account_id, 10).await.unwrap().is_empty());

        // Restock and the same quotation converts fine.
        db.ledger()
            .add_stock(account_id, product.id, 5, None, None, None)
            .await
            .unwrap();
        assert!(db
            .ledger()
            .convert_quotation(account_id, quotation.id, PaymentMethod::Cash, None)
            .await
            .is_ok());
    }
}
