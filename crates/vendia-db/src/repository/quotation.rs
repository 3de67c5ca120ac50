//! # Quotation Repository
//!
//! Row-level access for quotations and their line items.
//!
//! ## Status Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  draft ──► sent ──► accepted ──► converted                              │
//! │              │          │                                               │
//! │              ▼          ▼                                               │
//! │          rejected    expired                                            │
//! │                                                                         │
//! │  set_status() moves between the caller-facing states.                   │
//! │  'converted' is NOT one of them: only the ledger engine's conversion    │
//! │  sets it, in the same transaction that creates the sale, together       │
//! │  with converted_sale_id. A CHECK constraint ties the two together.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vendia_core::{Quotation, QuotationLineItem, QuotationStatus};

const QUOTATION_COLUMNS: &str = r#"
    id, account_id, customer_id, number, quote_date, valid_until,
    subtotal_cents, tax_cents, discount_cents, total_cents,
    status, converted_sale_id, notes, created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, quotation_id, product_id, name_snapshot, quantity,
    unit_price_cents, subtotal_cents, discount_cents, warranty_days
"#;

/// Repository for quotation database operations.
#[derive(Debug, Clone)]
pub struct QuotationRepository {
    pool: SqlitePool,
}

impl QuotationRepository {
    /// Creates a new QuotationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QuotationRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a quotation by ID within the account.
    pub async fn get(&self, account_id: i64, id: i64) -> DbResult<Option<Quotation>> {
        let quotation = sqlx::query_as::<_, Quotation>(&format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quotation)
    }

    /// Gets all line items for a quotation.
    pub async fn get_items(&self, quotation_id: i64) -> DbResult<Vec<QuotationLineItem>> {
        let items = sqlx::query_as::<_, QuotationLineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM quotation_items WHERE quotation_id = ?1 ORDER BY id"
        ))
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists quotations in a given status, newest first.
    pub async fn list_by_status(
        &self,
        account_id: i64,
        status: QuotationStatus,
        limit: u32,
    ) -> DbResult<Vec<Quotation>> {
        let quotations = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            SELECT {QUOTATION_COLUMNS} FROM quotations
            WHERE account_id = ?1 AND status = ?2
            ORDER BY quote_date DESC, id DESC
            LIMIT ?3
            "#
        ))
        .bind(account_id)
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    // =========================================================================
    // Status updates
    // =========================================================================

    /// Moves a quotation between caller-facing statuses.
    ///
    /// `Converted` is rejected here: the only path to it is the ledger
    /// engine's conversion, which sets it together with `converted_sale_id`.
    /// A converted quotation is terminal and is never moved again.
    pub async fn set_status(
        &self,
        account_id: i64,
        id: i64,
        status: QuotationStatus,
    ) -> DbResult<()> {
        if status == QuotationStatus::Converted {
            return Err(DbError::CheckViolation {
                message: "quotations reach 'converted' only through conversion".to_string(),
            });
        }

        debug!(id, status = status.as_str(), "Updating quotation status");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE quotations SET status = ?3, updated_at = ?4
            WHERE id = ?1 AND account_id = ?2 AND status != 'converted'
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quotation (not converted)", id));
        }

        Ok(())
    }

    // =========================================================================
    // Tx-scoped writes (ledger engine only)
    // =========================================================================

    pub(crate) async fn get_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        id: i64,
    ) -> DbResult<Option<Quotation>> {
        let quotation = sqlx::query_as::<_, Quotation>(&format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(quotation)
    }

    pub(crate) async fn get_items_tx(
        conn: &mut SqliteConnection,
        quotation_id: i64,
    ) -> DbResult<Vec<QuotationLineItem>> {
        let items = sqlx::query_as::<_, QuotationLineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM quotation_items WHERE quotation_id = ?1 ORDER BY id"
        ))
        .bind(quotation_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Inserts the quotation header row; returns the new id.
    pub(crate) async fn insert_quotation_tx(
        conn: &mut SqliteConnection,
        quotation: &Quotation,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO quotations (account_id, customer_id, number, quote_date, valid_until,
                                    subtotal_cents, tax_cents, discount_cents, total_cents,
                                    status, converted_sale_id, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(quotation.account_id)
        .bind(quotation.customer_id)
        .bind(&quotation.number)
        .bind(quotation.quote_date)
        .bind(quotation.valid_until)
        .bind(quotation.subtotal_cents)
        .bind(quotation.tax_cents)
        .bind(quotation.discount_cents)
        .bind(quotation.total_cents)
        .bind(quotation.status)
        .bind(quotation.converted_sale_id)
        .bind(&quotation.notes)
        .bind(quotation.created_at)
        .bind(quotation.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts one quotation line item; returns the new id.
    pub(crate) async fn insert_item_tx(
        conn: &mut SqliteConnection,
        item: &QuotationLineItem,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO quotation_items (quotation_id, product_id, name_snapshot, quantity,
                                         unit_price_cents, subtotal_cents, discount_cents,
                                         warranty_days)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(item.quotation_id)
        .bind(item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .bind(item.discount_cents)
        .bind(item.warranty_days)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Marks an accepted quotation converted, recording the produced sale.
    ///
    /// Runs in the same transaction as the sale commit; the guard on status
    /// keeps a concurrent conversion from double-selling the quote.
    pub(crate) async fn mark_converted_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        id: i64,
        sale_id: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE quotations
            SET status = 'converted', converted_sale_id = ?3, updated_at = ?4
            WHERE id = ?1 AND account_id = ?2 AND status = 'accepted'
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(sale_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quotation (accepted)", id));
        }

        Ok(())
    }
}
