//! # Sale Transaction Engine
//!
//! Turns a validated cart into a durable sale.
//!
//! ## The Five Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. VALIDATE   cart non-empty, lines well-formed, serials match,        │
//! │                credit sale ⇒ customer + positive term                   │
//! │                (pure, before any database work)                         │
//! │  2. PRICE      tax-inclusive split per line, aggregates rounded once    │
//! │  3. STOCK      every tracked line's product must cover the requested    │
//! │                quantity — the authoritative check, client-side checks   │
//! │                notwithstanding                                          │
//! │  4. COMMIT     one transaction:                                         │
//! │                  sequence number (atomic increment-and-fetch)           │
//! │                  sale + line items                                      │
//! │                  conditional stock decrement + 'out' movement per line  │
//! │                  serial records (expiry = sale date + warranty)         │
//! │                  receivable for credit sales                            │
//! │  5. RETURN     the persisted sale                                       │
//! │                                                                         │
//! │  Any failure in 1–3: zero side effects.                                 │
//! │  Any failure in 4: the transaction rolls back — including the           │
//! │  sequence increment — so resubmission is always safe.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use sqlx::SqliteConnection;
use tracing::info;

use crate::ledger::{Ledger, LedgerResult};
use crate::repository::account::AccountRepository;
use crate::repository::debt::DebtRepository;
use crate::repository::party::PartyRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::stock::{self, StockRepository};
use vendia_core::tax::split_line;
use vendia_core::{
    CartLine, CoreError, CreateSale, Customer, DebtStatus, Money, MovementKind, PaymentMethod,
    Product, Receivable, Sale, SaleLineItem, SaleStatus, SerialRecord, TaxTotals, ValidationError,
};

impl Ledger {
    /// Creates a sale from a cart: the whole five-step flow, one
    /// transaction, all or nothing.
    pub async fn create_sale(&self, account_id: i64, request: CreateSale) -> LedgerResult<Sale> {
        // Step 1: pure validation, before any database work.
        request.validate()?;

        let mut tx = self.pool().begin().await?;
        let sale = commit_sale(&mut tx, account_id, &request).await?;
        tx.commit().await?;

        info!(
            account_id,
            sale_id = sale.id,
            number = %sale.number,
            total_cents = sale.total_cents,
            lines = request.lines.len(),
            "Sale committed"
        );

        Ok(sale)
    }
}

/// One line after pricing: the cart line joined with its product row and
/// the amounts actually charged.
struct PricedLine<'a> {
    line: &'a CartLine,
    product: Product,
    unit_price_cents: i64,
    net_cents: i64,
}

/// Prices and commits a sale inside the caller's transaction.
///
/// Shared between [`Ledger::create_sale`] and quotation conversion, which
/// adds its own writes to the same transaction. The request must already
/// have passed [`CreateSale::validate`].
pub(crate) async fn commit_sale(
    conn: &mut SqliteConnection,
    account_id: i64,
    request: &CreateSale,
) -> LedgerResult<Sale> {
    let now = Utc::now();

    // Resolve the customer first: credit sales owe the money to somebody,
    // and serial records snapshot the name.
    let customer: Option<Customer> = match request.customer_id {
        Some(id) => Some(
            PartyRepository::get_customer_tx(conn, account_id, id)
                .await?
                .ok_or(CoreError::CustomerNotFound(id))?,
        ),
        None => None,
    };

    // Step 2: load products and price every line.
    let mut priced: Vec<PricedLine> = Vec::with_capacity(request.lines.len());
    let mut totals = TaxTotals::new();
    let mut discount_cents = 0i64;

    for line in &request.lines {
        let product = ProductRepository::get_tx(conn, account_id, line.product_id)
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
        priced.push(PricedLine {
            line,
            product,
            unit_price_cents,
            net_cents: net.cents(),
        });
    }

    // Step 3: authoritative stock check, aggregated per product so that two
    // lines of the same product are judged together. Nothing has been
    // written yet; a shortfall aborts with zero side effects.
    let mut by_product: BTreeMap<i64, (String, i64, i64)> = BTreeMap::new();
    for p in priced.iter().filter(|p| p.product.track_stock) {
        let entry = by_product
            .entry(p.product.id)
            .or_insert_with(|| (p.product.name.clone(), p.product.stock, 0));
        entry.2 += p.line.quantity;
    }
    for (name, available, requested) in by_product.into_values() {
        if requested > available {
            return Err(CoreError::InsufficientStock {
                product: name,
                available,
                requested,
            }
            .into());
        }
    }

    let breakdown = totals.finish();

    // Step 4: commit. The sequence increment participates in the
    // transaction, so a failure below un-burns the number.
    let number = AccountRepository::take_sale_number(conn, account_id)
        .await?
        .ok_or(CoreError::AccountNotFound(account_id))?;

    let mut sale = Sale {
        id: 0,
        account_id,
        customer_id: request.customer_id,
        number,
        sale_date: now,
        subtotal_cents: breakdown.subtotal.cents(),
        tax_cents: breakdown.tax.cents(),
        discount_cents,
        total_cents: breakdown.total.cents(),
        payment_method: request.payment_method,
        status: SaleStatus::Completed,
        notes: request.notes.clone(),
        created_at: now,
    };
    sale.id = SaleRepository::insert_sale_tx(conn, &sale).await?;

    for p in &priced {
        let mut item = SaleLineItem {
            id: 0,
            sale_id: sale.id,
            product_id: p.product.id,
            name_snapshot: p.product.name.clone(),
            quantity: p.line.quantity,
            unit_price_cents: p.unit_price_cents,
            subtotal_cents: p.net_cents,
            discount_cents: p.line.discount_cents,
            has_serial: p.line.has_serial,
            warranty_days: p.line.warranty_days,
        };
        item.id = SaleRepository::insert_item_tx(conn, &item).await?;

        if p.product.track_stock {
            // Conditional decrement: still the authoritative guard even
            // after the step-3 check, because a concurrent sale may have
            // taken the stock in between.
            let decremented = StockRepository::decrement_stock_tx(
                conn,
                account_id,
                p.product.id,
                p.line.quantity,
                now,
            )
            .await?;
            if !decremented {
                let available =
                    StockRepository::current_stock_tx(conn, account_id, p.product.id)
                        .await?
                        .unwrap_or(0);
                return Err(CoreError::InsufficientStock {
                    product: p.product.name.clone(),
                    available,
                    requested: p.line.quantity,
                }
                .into());
            }

            let mut movement = stock::movement(
                account_id,
                p.product.id,
                MovementKind::Out,
                p.line.quantity,
                "sale",
                now,
            );
            movement.sale_id = Some(sale.id);
            StockRepository::insert_movement_tx(conn, &movement).await?;
        }

        if p.line.has_serial {
            for serial in &p.line.serials {
                let record = SerialRecord {
                    id: 0,
                    account_id,
                    sale_id: sale.id,
                    product_id: p.product.id,
                    customer_id: request.customer_id,
                    serial: serial.clone(),
                    product_name: p.product.name.clone(),
                    customer_name: customer.as_ref().map(|c| c.name.clone()),
                    sale_number: sale.number.clone(),
                    sold_at: now,
                    warranty_days: p.line.warranty_days,
                    warranty_until: now + Duration::days(p.line.warranty_days),
                    created_at: now,
                };
                SaleRepository::insert_serial_tx(conn, &record).await?;
            }
        }
    }

    if request.payment_method == PaymentMethod::Credit {
        // validate() established both; the ok_or keeps the invariant local.
        let customer_id = request
            .customer_id
            .ok_or(CoreError::CreditSaleRequiresCustomer)?;
        let credit_days = request.credit_days.ok_or(CoreError::CreditSaleRequiresTerm)?;

        let receivable = Receivable {
            id: 0,
            account_id,
            customer_id,
            sale_id: Some(sale.id),
            amount_cents: sale.total_cents,
            paid_cents: 0,
            remaining_cents: sale.total_cents,
            due_date: now + Duration::days(credit_days),
            status: DebtStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        DebtRepository::insert_receivable_tx(conn, &receivable).await?;
    }

    Ok(sale)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::ledger::testutil::{seed_customer, seed_product, test_db};
    use crate::ledger::LedgerError;
    use crate::repository::product::NewProduct;
    use chrono::{Duration, Utc};
    use vendia_core::{CartLine, CoreError, CreateSale, DebtStatus, PaymentMethod, TaxClass};

    /// Product priced 119,000.00 tax-inclusive at 19%, quantity 2:
    /// gross 238,000.00, net 200,000.00, tax 38,000.00.
    #[tokio::test]
    async fn test_cash_sale_totals_and_stock() {
        let (db, account_id) = test_db().await;
        let product =
            seed_product(&db, account_id, "TV-55", 119_000_00, TaxClass::Rate19, 10).await;

        let request = CreateSale::new(PaymentMethod::Cash, vec![CartLine::new(product.id, 2)]);
        let sale = db.ledger().create_sale(account_id, request).await.unwrap();

        assert_eq!(sale.number, "INV-000001");
        assert_eq!(sale.total_cents, 238_000_00);
        assert_eq!(sale.subtotal_cents, 200_000_00);
        assert_eq!(sale.tax_cents, 38_000_00);
        assert_eq!(sale.subtotal_cents + sale.tax_cents, sale.total_cents);

        // Stock decremented, movement tied 1:1 to the line.
        let product = db.products().get(account_id, product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 8);

        let movements = db.stock().movements_for_sale(sale.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, 2);
        assert_eq!(movements[0].reason, "sale");

        let items = db.sales().get_items(sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name_snapshot, product.name);
        assert_eq!(items[0].subtotal_cents, 200_000_00);

        // Line subtotals sum to the sale subtotal (within rounding slack).
        let line_sum: i64 = items.iter().map(|i| i.subtotal_cents).sum();
        assert!((line_sum - sale.subtotal_cents).abs() <= 1);

        // Sequence advances.
        let request = CreateSale::new(PaymentMethod::Cash, vec![CartLine::new(product.id, 1)]);
        let next = db.ledger().create_sale(account_id, request).await.unwrap();
        assert_eq!(next.number, "INV-000002");
    }

    #[tokio::test]
    async fn test_credit_sale_creates_receivable() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;
        let product = seed_product(&db, account_id, "WID-001", 50_000_00, TaxClass::Exempt, 5).await;

        let request = CreateSale::new(PaymentMethod::Credit, vec![CartLine::new(product.id, 2)])
            .for_customer(customer.id)
            .with_credit_days(30);
        let sale = db.ledger().create_sale(account_id, request).await.unwrap();

        let receivables = db.debts().list_open_receivables(account_id).await.unwrap();
        assert_eq!(receivables.len(), 1);

        let receivable = &receivables[0];
        assert_eq!(receivable.sale_id, Some(sale.id));
        assert_eq!(receivable.customer_id, customer.id);
        assert_eq!(receivable.amount_cents, sale.total_cents);
        assert_eq!(receivable.remaining_cents, sale.total_cents);
        assert_eq!(receivable.paid_cents, 0);
        assert_eq!(receivable.status, DebtStatus::Pending);

        // due = sale date + credit days
        let expected_due = sale.sale_date + Duration::days(30);
        assert_eq!(receivable.due_date, expected_due);
    }

    /// Credit sale with no customer: rejected before any write — stock and
    /// the sequence counter are untouched.
    #[tokio::test]
    async fn test_credit_sale_without_customer_has_no_side_effects() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 10_000, TaxClass::Rate19, 5).await;

        let request = CreateSale::new(PaymentMethod::Credit, vec![CartLine::new(product.id, 1)])
            .with_credit_days(30);
        let err = db.ledger().create_sale(account_id, request).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::CreditSaleRequiresCustomer)
        ));

        let product = db.products().get(account_id, product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);

        // The counter never moved: the next sale is still number one.
        let request = CreateSale::new(PaymentMethod::Cash, vec![CartLine::new(product.id, 1)]);
        let sale = db.ledger().create_sale(account_id, request).await.unwrap();
        assert_eq!(sale.number, "INV-000001");
    }

    /// Two lines of the same product whose combined quantity exceeds stock:
    /// the whole sale is rejected, no partial decrement.
    #[tokio::test]
    async fn test_combined_lines_exceeding_stock_reject_whole_sale() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 10_000, TaxClass::Rate19, 5).await;

        let request = CreateSale::new(
            PaymentMethod::Cash,
            vec![CartLine::new(product.id, 3), CartLine::new(product.id, 3)],
        );
        let err = db.ledger().create_sale(account_id, request).await.unwrap_err();

        match err {
            LedgerError::Core(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let product = db.products().get(account_id, product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);

        assert!(db.sales().list_recent(account_id, 10).await.unwrap().is_empty());
        assert_eq!(db.stock().history(account_id, product.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_serialized_line_creates_serial_records() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;
        let product =
            seed_product(&db, account_id, "PHONE-9", 90_000_00, TaxClass::Rate19, 4).await;

        let line = CartLine::new(product.id, 2)
            .with_serials(vec!["SN-A1".into(), "SN-A2".into()])
            .with_warranty(365);
        let request =
            CreateSale::new(PaymentMethod::Card, vec![line]).for_customer(customer.id);
        let sale = db.ledger().create_sale(account_id, request).await.unwrap();

        let serials = db.sales().get_serials(sale.id).await.unwrap();
        assert_eq!(serials.len(), 2);

        let record = &serials[0];
        assert_eq!(record.serial, "SN-A1");
        assert_eq!(record.product_name, product.name);
        assert_eq!(record.customer_name.as_deref(), Some("Ada Buyer"));
        assert_eq!(record.sale_number, sale.number);
        assert_eq!(record.warranty_days, 365);
        assert_eq!(record.warranty_until, record.sold_at + Duration::days(365));

        let found = db.sales().find_serial(account_id, "SN-A2").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_serial_count_mismatch_rejected_before_writes() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "PHONE-9", 90_000, TaxClass::Rate19, 4).await;

        let line = CartLine::new(product.id, 2).with_serials(vec!["SN-A1".into()]);
        let request = CreateSale::new(PaymentMethod::Cash, vec![line]);
        assert!(db.ledger().create_sale(account_id, request).await.is_err());

        let product = db.products().get(account_id, product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 4);
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_products_rejected() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 10_000, TaxClass::Rate19, 5).await;

        let request = CreateSale::new(PaymentMethod::Cash, vec![CartLine::new(9999, 1)]);
        assert!(matches!(
            db.ledger().create_sale(account_id, request).await.unwrap_err(),
            LedgerError::Core(CoreError::ProductNotFound(9999))
        ));

        db.products().soft_delete(account_id, product.id).await.unwrap();
        let request = CreateSale::new(PaymentMethod::Cash, vec![CartLine::new(product.id, 1)]);
        assert!(matches!(
            db.ledger().create_sale(account_id, request).await.unwrap_err(),
            LedgerError::Core(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_untracked_product_skips_stock() {
        let (db, account_id) = test_db().await;
        let product = db
            .products()
            .create(
                account_id,
                NewProduct {
                    sku: "SRV-01".to_string(),
                    name: "Installation service".to_string(),
                    unit_price_cents: 25_000_00,
                    tax_class: TaxClass::Rate19,
                    track_stock: false,
                    low_stock_threshold: None,
                },
            )
            .await
            .unwrap();

        // Stock is zero and untracked: the sale still goes through.
        let request = CreateSale::new(PaymentMethod::Cash, vec![CartLine::new(product.id, 3)]);
        let sale = db.ledger().create_sale(account_id, request).await.unwrap();

        assert!(db.stock().movements_for_sale(sale.id).await.unwrap().is_empty());

        let product = db.products().get(account_id, product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn test_line_discount_flows_into_totals() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 11_900, TaxClass::Rate19, 10).await;

        // 2 × 119.00 − 23.80 discount = 214.20 gross → 180.00 net + 34.20 tax
        let line = CartLine::new(product.id, 2).with_discount(2_380);
        let request = CreateSale::new(PaymentMethod::Cash, vec![line]);
        let sale = db.ledger().create_sale(account_id, request).await.unwrap();

        assert_eq!(sale.total_cents, 21_420);
        assert_eq!(sale.subtotal_cents, 18_000);
        assert_eq!(sale.tax_cents, 3_420);
        assert_eq!(sale.discount_cents, 2_380);

        // Discount may not exceed the line gross.
        let line = CartLine::new(product.id, 1).with_discount(20_000);
        let request = CreateSale::new(PaymentMethod::Cash, vec![line]);
        assert!(db.ledger().create_sale(account_id, request).await.is_err());
    }

    /// The cart payload arrives as JSON at the real boundary; the typed
    /// request deserializes straight from it.
    #[tokio::test]
    async fn test_request_deserializes_from_json_payload() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 11_900, TaxClass::Rate19, 5).await;

        let payload = serde_json::json!({
            "customer_id": null,
            "payment_method": "cash",
            "credit_days": null,
            "notes": "walk-in",
            "lines": [{
                "product_id": product.id,
                "quantity": 2,
                "unit_price_cents": null,
                "discount_cents": 0,
                "has_serial": false,
                "serials": [],
                "warranty_days": 0
            }]
        });

        let request: CreateSale = serde_json::from_value(payload).unwrap();
        let sale = db.ledger().create_sale(account_id, request).await.unwrap();
        assert_eq!(sale.total_cents, 23_800);
        assert_eq!(sale.notes.as_deref(), Some("walk-in"));
    }

    #[tokio::test]
    async fn test_sale_date_is_commit_time() {
        let (db, account_id) = test_db().await;
        let product = seed_product(&db, account_id, "WID-001", 10_000, TaxClass::Exempt, 5).await;

        let before = Utc::now();
        let request = CreateSale::new(PaymentMethod::Transfer, vec![CartLine::new(product.id, 1)]);
        let sale = db.ledger().create_sale(account_id, request).await.unwrap();
        let after = Utc::now();

        assert!(sale.sale_date >= before && sale.sale_date <= after);

        let stored = db.sales().get(account_id, sale.id).await.unwrap().unwrap();
        assert_eq!(stored.number, sale.number);
        assert_eq!(stored.total_cents, sale.total_cents);
    }
}
