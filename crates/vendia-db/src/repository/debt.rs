//! # Debt Repository
//!
//! Row-level access for receivables, payables, and the payments applied
//! against them.
//!
//! ## Balance Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  remaining_cents == amount_cents − paid_cents, always                   │
//! │  paid_cents only increases                                              │
//! │                                                                         │
//! │  The stored status is a pure function of the paid fraction              │
//! │  (DebtStatus::from_amounts); 'overdue' is derived at read time and      │
//! │  never stored.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Applying a payment is the debt ledger's job (`Ledger::add_payment`); the
//! tx-scoped update here is its building block.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vendia_core::{DebtPayment, DebtStatus, Payable, Receivable};

const RECEIVABLE_COLUMNS: &str = r#"
    id, account_id, customer_id, sale_id, amount_cents, paid_cents,
    remaining_cents, due_date, status, created_at, updated_at
"#;

const PAYABLE_COLUMNS: &str = r#"
    id, account_id, supplier_id, reference, amount_cents, paid_cents,
    remaining_cents, due_date, status, created_at, updated_at
"#;

const PAYMENT_COLUMNS: &str = r#"
    id, account_id, receivable_id, payable_id, amount_cents,
    method, paid_at, notes, created_at
"#;

/// The single target of a debt payment: a receivable or a payable,
/// never both, never neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtRef {
    Receivable(i64),
    Payable(i64),
}

/// Repository for receivable/payable database operations.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
}

impl DebtRepository {
    /// Creates a new DebtRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DebtRepository { pool }
    }

    // =========================================================================
    // Receivables
    // =========================================================================

    /// Creates a receivable not originating from a credit sale
    /// (e.g. an opening balance carried into the system).
    pub async fn create_receivable(
        &self,
        account_id: i64,
        customer_id: i64,
        amount_cents: i64,
        due_date: DateTime<Utc>,
    ) -> DbResult<Receivable> {
        let now = Utc::now();
        let receivable = Receivable {
            id: 0,
            account_id,
            customer_id,
            sale_id: None,
            amount_cents,
            paid_cents: 0,
            remaining_cents: amount_cents,
            due_date,
            status: DebtStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.acquire().await?;
        let id = Self::insert_receivable_tx(&mut conn, &receivable).await?;

        Ok(Receivable { id, ..receivable })
    }

    /// Gets a receivable by ID within the account.
    pub async fn get_receivable(&self, account_id: i64, id: i64) -> DbResult<Option<Receivable>> {
        let receivable = sqlx::query_as::<_, Receivable>(&format!(
            "SELECT {RECEIVABLE_COLUMNS} FROM receivables WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(receivable)
    }

    /// Lists receivables that still carry a balance, oldest due first.
    ///
    /// The stored status never says `overdue`; apply
    /// [`Receivable::status_as_of`] for display.
    pub async fn list_open_receivables(&self, account_id: i64) -> DbResult<Vec<Receivable>> {
        let receivables = sqlx::query_as::<_, Receivable>(&format!(
            r#"
            SELECT {RECEIVABLE_COLUMNS} FROM receivables
            WHERE account_id = ?1 AND status != 'paid'
            ORDER BY due_date
            "#
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(receivables)
    }

    pub(crate) async fn get_receivable_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        id: i64,
    ) -> DbResult<Option<Receivable>> {
        let receivable = sqlx::query_as::<_, Receivable>(&format!(
            "SELECT {RECEIVABLE_COLUMNS} FROM receivables WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(receivable)
    }

    pub(crate) async fn insert_receivable_tx(
        conn: &mut SqliteConnection,
        receivable: &Receivable,
    ) -> DbResult<i64> {
        debug!(
            customer_id = receivable.customer_id,
            amount = receivable.amount_cents,
            "Inserting receivable"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO receivables (account_id, customer_id, sale_id, amount_cents,
                                     paid_cents, remaining_cents, due_date, status,
                                     created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(receivable.account_id)
        .bind(receivable.customer_id)
        .bind(receivable.sale_id)
        .bind(receivable.amount_cents)
        .bind(receivable.paid_cents)
        .bind(receivable.remaining_cents)
        .bind(receivable.due_date)
        .bind(receivable.status)
        .bind(receivable.created_at)
        .bind(receivable.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Applies new paid/remaining amounts and the recomputed status.
    pub(crate) async fn update_receivable_balance_tx(
        conn: &mut SqliteConnection,
        id: i64,
        paid_cents: i64,
        remaining_cents: i64,
        status: DebtStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE receivables
            SET paid_cents = ?2, remaining_cents = ?3, status = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(paid_cents)
        .bind(remaining_cents)
        .bind(status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Payables
    // =========================================================================

    /// Creates a payable owed to a supplier.
    pub async fn create_payable(
        &self,
        account_id: i64,
        supplier_id: i64,
        reference: Option<&str>,
        amount_cents: i64,
        due_date: DateTime<Utc>,
    ) -> DbResult<Payable> {
        let now = Utc::now();

        debug!(supplier_id, amount = amount_cents, "Inserting payable");

        let result = sqlx::query(
            r#"
            INSERT INTO payables (account_id, supplier_id, reference, amount_cents,
                                  paid_cents, remaining_cents, due_date, status,
                                  created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?4, ?5, 'pending', ?6, ?6)
            "#,
        )
        .bind(account_id)
        .bind(supplier_id)
        .bind(reference)
        .bind(amount_cents)
        .bind(due_date)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Payable {
            id: result.last_insert_rowid(),
            account_id,
            supplier_id,
            reference: reference.map(str::to_string),
            amount_cents,
            paid_cents: 0,
            remaining_cents: amount_cents,
            due_date,
            status: DebtStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a payable by ID within the account.
    pub async fn get_payable(&self, account_id: i64, id: i64) -> DbResult<Option<Payable>> {
        let payable = sqlx::query_as::<_, Payable>(&format!(
            "SELECT {PAYABLE_COLUMNS} FROM payables WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payable)
    }

    /// Lists payables that still carry a balance, oldest due first.
    pub async fn list_open_payables(&self, account_id: i64) -> DbResult<Vec<Payable>> {
        let payables = sqlx::query_as::<_, Payable>(&format!(
            r#"
            SELECT {PAYABLE_COLUMNS} FROM payables
            WHERE account_id = ?1 AND status != 'paid'
            ORDER BY due_date
            "#
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payables)
    }

    pub(crate) async fn get_payable_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        id: i64,
    ) -> DbResult<Option<Payable>> {
        let payable = sqlx::query_as::<_, Payable>(&format!(
            "SELECT {PAYABLE_COLUMNS} FROM payables WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(payable)
    }

    pub(crate) async fn update_payable_balance_tx(
        conn: &mut SqliteConnection,
        id: i64,
        paid_cents: i64,
        remaining_cents: i64,
        status: DebtStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE payables
            SET paid_cents = ?2, remaining_cents = ?3, status = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(paid_cents)
        .bind(remaining_cents)
        .bind(status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Lists the payments applied against one debt, oldest first.
    pub async fn payments_for(&self, target: DebtRef) -> DbResult<Vec<DebtPayment>> {
        let (column, id) = match target {
            DebtRef::Receivable(id) => ("receivable_id", id),
            DebtRef::Payable(id) => ("payable_id", id),
        };

        let payments = sqlx::query_as::<_, DebtPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM debt_payments WHERE {column} = ?1 ORDER BY paid_at, id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Inserts one payment row linked to exactly one target.
    pub(crate) async fn insert_payment_tx(
        conn: &mut SqliteConnection,
        payment: &DebtPayment,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO debt_payments (account_id, receivable_id, payable_id,
                                       amount_cents, method, paid_at, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(payment.account_id)
        .bind(payment.receivable_id)
        .bind(payment.payable_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(payment.paid_at)
        .bind(payment.notes.as_deref())
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
