//! # Product Repository
//!
//! Catalog access for products.
//!
//! ## Stock Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  This repository NEVER touches the stock counter.                       │
//! │                                                                         │
//! │  • Products are created with stock 0                                    │
//! │  • update_details() excludes the stock column                           │
//! │  • All counter changes flow through the Stock Ledger, which pairs       │
//! │    every change with an append-only movement row                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vendia_core::{Product, TaxClass};

const PRODUCT_COLUMNS: &str = r#"
    id, account_id, sku, name, unit_price_cents, tax_class,
    stock, track_stock, low_stock_threshold, is_active,
    created_at, updated_at
"#;

/// Input for creating a product. Stock starts at zero and is only ever
/// moved by the Stock Ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    /// Tax-inclusive unit price in cents.
    pub unit_price_cents: i64,
    pub tax_class: TaxClass,
    pub track_stock: bool,
    pub low_stock_threshold: Option<i64>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product, stock 0
    /// * `Err(DbError::UniqueViolation)` - SKU already exists in the account
    pub async fn create(&self, account_id: i64, new: NewProduct) -> DbResult<Product> {
        let now = Utc::now();

        debug!(account_id, sku = %new.sku, "Creating product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (account_id, sku, name, unit_price_cents, tax_class,
                                  stock, track_stock, low_stock_threshold, is_active,
                                  created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, 1, ?8, ?8)
            "#,
        )
        .bind(account_id)
        .bind(&new.sku)
        .bind(&new.name)
        .bind(new.unit_price_cents)
        .bind(new.tax_class)
        .bind(new.track_stock)
        .bind(new.low_stock_threshold)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: result.last_insert_rowid(),
            account_id,
            sku: new.sku,
            name: new.name,
            unit_price_cents: new.unit_price_cents,
            tax_class: new.tax_class,
            stock: 0,
            track_stock: new.track_stock,
            low_stock_threshold: new.low_stock_threshold,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a product by ID within the account.
    pub async fn get(&self, account_id: i64, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Same lookup inside a caller-owned transaction.
    ///
    /// The ledger engine uses this so the row it validates against belongs
    /// to the same transaction that later decrements it.
    pub(crate) async fn get_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        id: i64,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND account_id = ?2"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Lists active products, sorted by name.
    pub async fn list_active(&self, account_id: i64, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE account_id = ?1 AND is_active = 1
            ORDER BY name
            LIMIT ?2
            "#
        ))
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches active products by name or SKU substring.
    pub async fn search(&self, account_id: i64, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(account_id, query = %query, "Searching products");

        if query.is_empty() {
            return self.list_active(account_id, limit).await;
        }

        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE account_id = ?1 AND is_active = 1
              AND (name LIKE ?2 OR sku LIKE ?2)
            ORDER BY name
            LIMIT ?3
            "#
        ))
        .bind(account_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists tracked products at or below their low-stock threshold.
    pub async fn list_low_stock(&self, account_id: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE account_id = ?1 AND is_active = 1 AND track_stock = 1
              AND low_stock_threshold IS NOT NULL
              AND stock <= low_stock_threshold
            ORDER BY stock
            "#
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates catalog fields of an existing product.
    ///
    /// Deliberately excludes the stock counter; use the Stock Ledger for
    /// stock changes.
    pub async fn update_details(&self, product: &Product) -> DbResult<()> {
        debug!(id = product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?3,
                name = ?4,
                unit_price_cents = ?5,
                tax_class = ?6,
                track_stock = ?7,
                low_stock_threshold = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1 AND account_id = ?2
            "#,
        )
        .bind(product.id)
        .bind(product.account_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.unit_price_cents)
        .bind(product.tax_class)
        .bind(product.track_stock)
        .bind(product.low_stock_threshold)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sales keep referencing the row; it just stops being
    /// sellable.
    pub async fn soft_delete(&self, account_id: i64, id: i64) -> DbResult<()> {
        debug!(id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET is_active = 0, updated_at = ?3
            WHERE id = ?1 AND account_id = ?2
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self, account_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE account_id = ?1 AND is_active = 1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
