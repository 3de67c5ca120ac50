//! # Sale Repository
//!
//! Row-level access for sales, their line items, and serial records.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product and customer data are COPIED onto sale rows at commit time:    │
//! │                                                                         │
//! │  sale_items.name_snapshot        ← products.name                        │
//! │  sale_items.unit_price_cents     ← price actually charged               │
//! │  serial_records.product_name     ← products.name                        │
//! │  serial_records.customer_name    ← customers.name                       │
//! │  serial_records.sale_number      ← sales.number                         │
//! │                                                                         │
//! │  Renaming a product next year does not rewrite last year's invoices.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Creating a sale is the ledger engine's job — the inserts here are
//! tx-scoped building blocks, not a public write path.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use vendia_core::{Sale, SaleLineItem, SerialRecord};

const SALE_COLUMNS: &str = r#"
    id, account_id, customer_id, number, sale_date,
    subtotal_cents, tax_cents, discount_cents, total_cents,
    payment_method, status, notes, created_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, sale_id, product_id, name_snapshot, quantity,
    unit_price_cents, subtotal_cents, discount_cents, has_serial, warranty_days
"#;

const SERIAL_COLUMNS: &str = r#"
    id, account_id, sale_id, product_id, customer_id, serial,
    product_name, customer_name, sale_number, sold_at,
    warranty_days, warranty_until, created_at
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale by ID within the account.
    pub async fn get(&self, account_id: i64, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by its sequence number.
    pub async fn get_by_number(&self, account_id: i64, number: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE account_id = ?1 AND number = ?2"
        ))
        .bind(account_id)
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all line items for a sale.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleLineItem>> {
        let items = sqlx::query_as::<_, SaleLineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets all serial records created by a sale.
    pub async fn get_serials(&self, sale_id: i64) -> DbResult<Vec<SerialRecord>> {
        let serials = sqlx::query_as::<_, SerialRecord>(&format!(
            "SELECT {SERIAL_COLUMNS} FROM serial_records WHERE sale_id = ?1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(serials)
    }

    /// Looks up a serial record by serial number (warranty lookups).
    pub async fn find_serial(
        &self,
        account_id: i64,
        serial: &str,
    ) -> DbResult<Option<SerialRecord>> {
        let record = sqlx::query_as::<_, SerialRecord>(&format!(
            r#"
            SELECT {SERIAL_COLUMNS} FROM serial_records
            WHERE account_id = ?1 AND serial = ?2
            ORDER BY sold_at DESC
            LIMIT 1
            "#
        ))
        .bind(account_id)
        .bind(serial)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists recent sales, newest first.
    pub async fn list_recent(&self, account_id: i64, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE account_id = ?1
            ORDER BY sale_date DESC, id DESC
            LIMIT ?2
            "#
        ))
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    // =========================================================================
    // Tx-scoped writes (ledger engine only)
    // =========================================================================

    /// Inserts the sale header row; returns the new id.
    pub(crate) async fn insert_sale_tx(
        conn: &mut SqliteConnection,
        sale: &Sale,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (account_id, customer_id, number, sale_date,
                               subtotal_cents, tax_cents, discount_cents, total_cents,
                               payment_method, status, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(sale.account_id)
        .bind(sale.customer_id)
        .bind(&sale.number)
        .bind(sale.sale_date)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts one line item; returns the new id.
    pub(crate) async fn insert_item_tx(
        conn: &mut SqliteConnection,
        item: &SaleLineItem,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sale_items (sale_id, product_id, name_snapshot, quantity,
                                    unit_price_cents, subtotal_cents, discount_cents,
                                    has_serial, warranty_days)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(item.sale_id)
        .bind(item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .bind(item.discount_cents)
        .bind(item.has_serial)
        .bind(item.warranty_days)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts one serial record; returns the new id.
    pub(crate) async fn insert_serial_tx(
        conn: &mut SqliteConnection,
        record: &SerialRecord,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO serial_records (account_id, sale_id, product_id, customer_id,
                                        serial, product_name, customer_name, sale_number,
                                        sold_at, warranty_days, warranty_until, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(record.account_id)
        .bind(record.sale_id)
        .bind(record.product_id)
        .bind(record.customer_id)
        .bind(&record.serial)
        .bind(&record.product_name)
        .bind(&record.customer_name)
        .bind(&record.sale_number)
        .bind(record.sold_at)
        .bind(record.warranty_days)
        .bind(record.warranty_until)
        .bind(record.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
