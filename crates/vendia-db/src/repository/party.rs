//! # Party Repository
//!
//! Customers and suppliers. The wider CRM screens live outside this crate;
//! the ledger only needs existence checks, name snapshots, and enough of a
//! write path to create counterparties.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vendia_core::{Customer, Supplier};

/// Repository for customer and supplier rows.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    /// Creates a new PartyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Creates a customer.
    pub async fn create_customer(
        &self,
        account_id: i64,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> DbResult<Customer> {
        let now = Utc::now();

        debug!(account_id, name = %name, "Creating customer");

        let result = sqlx::query(
            r#"
            INSERT INTO customers (account_id, name, phone, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(account_id)
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            account_id,
            name: name.to_string(),
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            created_at: now,
        })
    }

    /// Gets a customer by ID within the account.
    pub async fn get_customer(&self, account_id: i64, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, account_id, name, phone, email, created_at
            FROM customers
            WHERE id = ?1 AND account_id = ?2
            "#,
        )
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Same lookup inside a caller-owned transaction.
    pub(crate) async fn get_customer_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        id: i64,
    ) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, account_id, name, phone, email, created_at
            FROM customers
            WHERE id = ?1 AND account_id = ?2
            "#,
        )
        .bind(id)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(customer)
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    /// Creates a supplier.
    pub async fn create_supplier(
        &self,
        account_id: i64,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> DbResult<Supplier> {
        let now = Utc::now();

        debug!(account_id, name = %name, "Creating supplier");

        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (account_id, name, phone, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(account_id)
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Supplier {
            id: result.last_insert_rowid(),
            account_id,
            name: name.to_string(),
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            created_at: now,
        })
    }

    /// Gets a supplier by ID within the account.
    pub async fn get_supplier(&self, account_id: i64, id: i64) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, account_id, name, phone, email, created_at
            FROM suppliers
            WHERE id = ?1 AND account_id = ?2
            "#,
        )
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Same lookup inside a caller-owned transaction.
    pub(crate) async fn get_supplier_tx(
        conn: &mut SqliteConnection,
        account_id: i64,
        id: i64,
    ) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, account_id, name, phone, email, created_at
            FROM suppliers
            WHERE id = ?1 AND account_id = ?2
            "#,
        )
        .bind(id)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(supplier)
    }
}
