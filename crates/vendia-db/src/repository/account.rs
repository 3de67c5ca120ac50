//! # Account Repository
//!
//! Accounts own everything else: every other table carries an `account_id`
//! and every query filters on it. The account row also carries the document
//! numbering configuration consumed at sale/quotation commit time.
//!
//! ## Sequence Numbers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: read-then-write (duplicate numbers under concurrency)        │
//! │     SELECT next_sale_number ...; UPDATE accounts SET ...                │
//! │                                                                         │
//! │  ✅ CORRECT: one atomic increment-and-fetch                             │
//! │     UPDATE accounts SET next_sale_number = next_sale_number + 1         │
//! │     WHERE id = ? RETURNING sale_prefix, next_sale_number - 1            │
//! │                                                                         │
//! │  Two concurrent sales serialize on the row and get distinct numbers.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vendia_core::Account;

/// Repository for account rows and sequence numbers.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Creates an account with its numbering configuration.
    pub async fn create(
        &self,
        name: &str,
        sale_prefix: &str,
        quotation_prefix: &str,
    ) -> DbResult<Account> {
        let now = Utc::now();

        debug!(name = %name, "Creating account");

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (name, sale_prefix, next_sale_number,
                                  quotation_prefix, next_quotation_number, created_at)
            VALUES (?1, ?2, 1, ?3, 1, ?4)
            "#,
        )
        .bind(name)
        .bind(sale_prefix)
        .bind(quotation_prefix)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Account {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            sale_prefix: sale_prefix.to_string(),
            next_sale_number: 1,
            quotation_prefix: quotation_prefix.to_string(),
            next_quotation_number: 1,
            created_at: now,
        })
    }

    /// Gets an account by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, sale_prefix, next_sale_number,
                   quotation_prefix, next_quotation_number, created_at
            FROM accounts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Atomically takes the next sale number for the account.
    ///
    /// Runs inside the caller's transaction: if the commit rolls back, the
    /// increment rolls back with it and the number is never burned.
    ///
    /// Returns `None` when the account row does not exist.
    pub(crate) async fn take_sale_number(
        conn: &mut SqliteConnection,
        account_id: i64,
    ) -> DbResult<Option<String>> {
        let row = sqlx::query_as::<_, (String, i64)>(
            r#"
            UPDATE accounts
            SET next_sale_number = next_sale_number + 1
            WHERE id = ?1
            RETURNING sale_prefix, next_sale_number - 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|(prefix, n)| format_number(&prefix, n)))
    }

    /// Atomically takes the next quotation number for the account.
    pub(crate) async fn take_quotation_number(
        conn: &mut SqliteConnection,
        account_id: i64,
    ) -> DbResult<Option<String>> {
        let row = sqlx::query_as::<_, (String, i64)>(
            r#"
            UPDATE accounts
            SET next_quotation_number = next_quotation_number + 1
            WHERE id = ?1
            RETURNING quotation_prefix, next_quotation_number - 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|(prefix, n)| format_number(&prefix, n)))
    }
}

/// Formats a document number: `INV` + 42 → `INV-000042`.
fn format_number(prefix: &str, n: i64) -> String {
    format!("{}-{:06}", prefix, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("INV", 1), "INV-000001");
        assert_eq!(format_number("QUO", 42), "QUO-000042");
        assert_eq!(format_number("INV", 1_234_567), "INV-1234567");
    }
}
