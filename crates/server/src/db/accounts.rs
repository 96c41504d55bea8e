//! Account repository.
//!
//! Accounts mirror auth-provider identities. Lifecycle webhooks are
//! delivered at least once, so the create path is an upsert keyed on the
//! provider's identity string.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use chalkbox_core::{AccountId, AccountRole, Email};

use super::RepositoryError;
use crate::models::Account;

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i32,
    external_id: String,
    email: String,
    role: AccountRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_domain(self) -> Result<Account, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Account {
            id: AccountId::new(self.id),
            external_id: self.external_id,
            email,
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, external_id, email, role, created_at, updated_at";

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an account by the auth provider's identity string.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(AccountRow::into_domain).transpose()
    }

    /// Get an account by internal ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(AccountRow::into_domain).transpose()
    }

    /// Create the account for `external_id` or refresh its email.
    ///
    /// The role of an existing account is never touched here; only admin
    /// action changes roles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        external_id: &str,
        email: &Email,
    ) -> Result<Account, RepositoryError> {
        let row: AccountRow = sqlx::query_as(&format!(
            "INSERT INTO account (external_id, email)
             VALUES ($1, $2)
             ON CONFLICT (external_id)
             DO UPDATE SET email = EXCLUDED.email, updated_at = now()
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(external_id)
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await?;

        row.into_domain()
    }

    /// Update the email of an existing account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_email(
        &self,
        external_id: &str,
        email: &Email,
    ) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "UPDATE account SET email = $2, updated_at = now()
             WHERE external_id = $1
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(external_id)
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(AccountRow::into_domain).transpose()
    }

    /// Delete an account. Enrollments and purchases cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, external_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM account WHERE external_id = $1")
            .bind(external_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Change an account's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_role(
        &self,
        id: AccountId,
        role: AccountRole,
    ) -> Result<Option<Account>, RepositoryError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "UPDATE account SET role = $2, updated_at = now()
             WHERE id = $1
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(self.pool)
        .await?;

        row.map(AccountRow::into_domain).transpose()
    }
}
