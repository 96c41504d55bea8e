//! Database operations for the Chalkbox `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `account` - local mirrors of auth-provider identities
//! - `course`, `module`, `module_content` - the catalog
//! - `enrollment` - one row per (account, course), unique
//! - `purchase` - gateway order ledger; partial unique index keeps at most
//!   one pending row per (account, course)
//! - `blog_post`
//!
//! The invariants the ledger relies on (no duplicate enrollment, single
//! pending purchase) are enforced by constraints in the schema, not by
//! application-level checks. Repositories map unique violations to
//! [`RepositoryError::Conflict`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p chalkbox-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod accounts;
pub mod blog;
pub mod courses;
pub mod enrollments;
pub mod memory;
pub mod postgres;
pub mod purchases;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::Store;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate enrollment).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
