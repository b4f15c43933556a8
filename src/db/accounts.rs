//! Account repository backing in-band registration.

use super::{Account, DbError};
use sqlx::SqlitePool;

/// Repository for account operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find account by name (exact match; node parts are case-sensitive).
    pub async fn find_by_name(&self, username: &str) -> Result<Option<Account>, DbError> {
        let row = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT username, password
            FROM accounts
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(username, password)| Account { username, password }))
    }

    /// Insert the account or overwrite the stored password.
    pub async fn upsert(&self, account: &Account) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO accounts (username, password, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET
                password = excluded.password,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&account.username)
        .bind(&account.password)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete an account. Missing accounts are not an error.
    pub async fn delete(&self, username: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM accounts WHERE username = ?")
            .bind(username)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
