//! # Debt Ledger Operations
//!
//! Applies payments against receivables and payables.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_payment(target, amount)                                            │
//! │       │                                                                 │
//! │       ├── amount ≤ 0            → ValidationError                       │
//! │       ├── target missing        → ReceivableNotFound / PayableNotFound  │
//! │       ├── amount > remaining    → Overpayment (nothing written)         │
//! │       │                                                                 │
//! │       ▼  one transaction                                                │
//! │  paid += amount                                                         │
//! │  remaining = total − paid                                               │
//! │  status = from_amounts(paid, total)   (paid / partial / pending)        │
//! │  + one payment row linked to exactly the one target                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::info;

use crate::ledger::{Ledger, LedgerResult};
use crate::repository::debt::{DebtRef, DebtRepository};
use vendia_core::validation::validate_payment_amount;
use vendia_core::{CoreError, DebtPayment, DebtStatus, PaymentMethod};

impl Ledger {
    /// Applies a payment against one receivable or payable.
    ///
    /// Rejects overpayment: `amount` may not exceed the target's remaining
    /// balance. On success the target's paid/remaining/status move together
    /// with the inserted payment row.
    pub async fn add_payment(
        &self,
        account_id: i64,
        target: DebtRef,
        amount_cents: i64,
        paid_at: DateTime<Utc>,
        method: PaymentMethod,
        notes: Option<&str>,
    ) -> LedgerResult<DebtPayment> {
        validate_payment_amount(amount_cents)?;

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let mut payment = DebtPayment {
            id: 0,
            account_id,
            receivable_id: None,
            payable_id: None,
            amount_cents,
            method,
            paid_at,
            notes: notes.map(str::to_string),
            created_at: now,
        };

        match target {
            DebtRef::Receivable(id) => {
                let receivable = DebtRepository::get_receivable_tx(&mut tx, account_id, id)
                    .await?
                    .ok_or(CoreError::ReceivableNotFound(id))?;

                if amount_cents > receivable.remaining_cents {
                    return Err(CoreError::Overpayment {
                        remaining_cents: receivable.remaining_cents,
                        requested_cents: amount_cents,
                    }
                    .into());
                }

                let paid = receivable.paid_cents + amount_cents;
                let remaining = receivable.amount_cents - paid;
                let status = DebtStatus::from_amounts(paid, receivable.amount_cents);

                DebtRepository::update_receivable_balance_tx(
                    &mut tx, id, paid, remaining, status, now,
                )
                .await?;

                payment.receivable_id = Some(id);
            }

            DebtRef::Payable(id) => {
                let payable = DebtRepository::get_payable_tx(&mut tx, account_id, id)
                    .await?
                    .ok_or(CoreError::PayableNotFound(id))?;

                if amount_cents > payable.remaining_cents {
                    return Err(CoreError::Overpayment {
                        remaining_cents: payable.remaining_cents,
                        requested_cents: amount_cents,
                    }
                    .into());
                }

                let paid = payable.paid_cents + amount_cents;
                let remaining = payable.amount_cents - paid;
                let status = DebtStatus::from_amounts(paid, payable.amount_cents);

                DebtRepository::update_payable_balance_tx(&mut tx, id, paid, remaining, status, now)
                    .await?;

                payment.payable_id = Some(id);
            }
        }

        payment.id = DebtRepository::insert_payment_tx(&mut tx, &payment).await?;
        tx.commit().await?;

        info!(account_id, ?target, amount_cents, "Payment applied");

        Ok(payment)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::{seed_customer, seed_supplier, test_db};
    use crate::ledger::LedgerError;
    use chrono::Duration;

    /// Receivable of 100,000: a payment of 60,000 leaves 40,000 partial; the
    /// follow-up 40,000 settles it.
    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;
        let due = Utc::now() + Duration::days(30);

        let receivable = db
            .debts()
            .create_receivable(account_id, customer.id, 100_000, due)
            .await
            .unwrap();

        db.ledger()
            .add_payment(
                account_id,
                DebtRef::Receivable(receivable.id),
                60_000,
                Utc::now(),
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        let receivable = db
            .debts()
            .get_receivable(account_id, receivable.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(receivable.paid_cents, 60_000);
        assert_eq!(receivable.remaining_cents, 40_000);
        assert_eq!(receivable.paid_cents + receivable.remaining_cents, 100_000);
        assert_eq!(receivable.status, DebtStatus::Partial);

        db.ledger()
            .add_payment(
                account_id,
                DebtRef::Receivable(receivable.id),
                40_000,
                Utc::now(),
                PaymentMethod::Transfer,
                None,
            )
            .await
            .unwrap();

        let receivable = db
            .debts()
            .get_receivable(account_id, receivable.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(receivable.remaining_cents, 0);
        assert_eq!(receivable.status, DebtStatus::Paid);

        let payments = db
            .debts()
            .payments_for(DebtRef::Receivable(receivable.id))
            .await
            .unwrap();
        assert_eq!(payments.len(), 2);
        assert!(payments.iter().all(|p| p.payable_id.is_none()));

        // Settled debts leave the open listing.
        assert!(db.debts().list_open_receivables(account_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overpayment_rejected_without_effects() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;
        let due = Utc::now() + Duration::days(30);

        let receivable = db
            .debts()
            .create_receivable(account_id, customer.id, 100_000, due)
            .await
            .unwrap();

        let err = db
            .ledger()
            .add_payment(
                account_id,
                DebtRef::Receivable(receivable.id),
                100_001,
                Utc::now(),
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap_err();

        match err {
            LedgerError::Core(CoreError::Overpayment {
                remaining_cents,
                requested_cents,
            }) => {
                assert_eq!(remaining_cents, 100_000);
                assert_eq!(requested_cents, 100_001);
            }
            other => panic!("expected Overpayment, got {other:?}"),
        }

        let receivable = db
            .debts()
            .get_receivable(account_id, receivable.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(receivable.paid_cents, 0);
        assert_eq!(receivable.status, DebtStatus::Pending);
        assert!(db
            .debts()
            .payments_for(DebtRef::Receivable(receivable.id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_payable_payment_path() {
        let (db, account_id) = test_db().await;
        let supplier = seed_supplier(&db, account_id).await;
        let due = Utc::now() + Duration::days(15);

        let payable = db
            .debts()
            .create_payable(account_id, supplier.id, Some("PO-77"), 50_000, due)
            .await
            .unwrap();

        let payment = db
            .ledger()
            .add_payment(
                account_id,
                DebtRef::Payable(payable.id),
                50_000,
                Utc::now(),
                PaymentMethod::Transfer,
                Some("full settlement"),
            )
            .await
            .unwrap();

        assert_eq!(payment.payable_id, Some(payable.id));
        assert_eq!(payment.receivable_id, None);

        let payable = db
            .debts()
            .get_payable(account_id, payable.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payable.status, DebtStatus::Paid);
        assert_eq!(payable.remaining_cents, 0);
    }

    #[tokio::test]
    async fn test_bad_payments_rejected() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;
        let due = Utc::now() + Duration::days(30);

        let receivable = db
            .debts()
            .create_receivable(account_id, customer.id, 10_000, due)
            .await
            .unwrap();

        for bad_amount in [0, -500] {
            assert!(db
                .ledger()
                .add_payment(
                    account_id,
                    DebtRef::Receivable(receivable.id),
                    bad_amount,
                    Utc::now(),
                    PaymentMethod::Cash,
                    None,
                )
                .await
                .is_err());
        }

        assert!(matches!(
            db.ledger()
                .add_payment(
                    account_id,
                    DebtRef::Receivable(9999),
                    1_000,
                    Utc::now(),
                    PaymentMethod::Cash,
                    None,
                )
                .await
                .unwrap_err(),
            LedgerError::Core(CoreError::ReceivableNotFound(9999))
        ));
    }

    #[tokio::test]
    async fn test_overdue_is_a_read_time_derivation() {
        let (db, account_id) = test_db().await;
        let customer = seed_customer(&db, account_id).await;

        // Due yesterday, still pending in storage.
        let due = Utc::now() - Duration::days(1);
        let receivable = db
            .debts()
            .create_receivable(account_id, customer.id, 10_000, due)
            .await
            .unwrap();

        let stored = db
            .debts()
            .get_receivable(account_id, receivable.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, DebtStatus::Pending);
        assert_eq!(stored.status_as_of(Utc::now()), DebtStatus::Overdue);
    }
}
