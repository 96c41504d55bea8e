//! Purchase ledger repository.
//!
//! Two storage-level rules make the ledger idempotent under client retries
//! and duplicate webhook delivery:
//!
//! - the partial unique index `purchase_single_pending_idx` allows only one
//!   pending row per (account, course), so concurrent begin-purchase calls
//!   converge on one gateway order;
//! - settlement is a conditional `UPDATE .. WHERE status = 'pending'`, so a
//!   replayed settlement updates zero rows and the already-settled row is
//!   returned as a no-op.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use chalkbox_core::{AccountId, CourseId, CurrencyCode, Price, PurchaseId, PurchaseStatus};

use super::RepositoryError;
use crate::models::{NewPendingPurchase, PendingPurchase, Purchase, SettledPurchase};

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: i32,
    account_id: i32,
    course_id: i32,
    amount_minor_units: i64,
    currency: String,
    status: PurchaseStatus,
    external_order_ref: String,
    external_payment_ref: Option<String>,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

impl PurchaseRow {
    fn into_domain(self) -> Result<Purchase, RepositoryError> {
        let currency = CurrencyCode::from_str(&self.currency)
            .map_err(|e| RepositoryError::DataCorruption(format!("purchase {}: {e}", self.id)))?;

        Ok(Purchase {
            id: PurchaseId::new(self.id),
            account_id: AccountId::new(self.account_id),
            course_id: CourseId::new(self.course_id),
            amount: Price::from_minor_units(self.amount_minor_units, currency),
            status: self.status,
            external_order_ref: self.external_order_ref,
            external_payment_ref: self.external_payment_ref,
            created_at: self.created_at,
            settled_at: self.settled_at,
        })
    }
}

const PURCHASE_COLUMNS: &str = "id, account_id, course_id, amount_minor_units, currency, status, \
                                external_order_ref, external_payment_ref, created_at, settled_at";

/// Repository for purchase database operations.
pub struct PurchaseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseRepository<'a> {
    /// Create a new purchase repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The purchase with the given status for (account, course), if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_status(
        &self,
        account_id: AccountId,
        course_id: CourseId,
        status: PurchaseStatus,
    ) -> Result<Option<Purchase>, RepositoryError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchase
             WHERE account_id = $1 AND course_id = $2 AND status = $3
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(account_id)
        .bind(course_id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        row.map(PurchaseRow::into_domain).transpose()
    }

    /// Atomically claim the single-pending slot for (account, course).
    ///
    /// `ON CONFLICT DO NOTHING` against the partial unique index means a
    /// concurrent loser inserts nothing; it then reads back the winner's row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail, or
    /// `RepositoryError::DataCorruption` if the pending row vanished between
    /// the insert attempt and the read-back (settled in the same instant).
    pub async fn insert_pending(
        &self,
        new: NewPendingPurchase,
    ) -> Result<PendingPurchase, RepositoryError> {
        let inserted: Option<PurchaseRow> = sqlx::query_as(&format!(
            "INSERT INTO purchase
                 (account_id, course_id, amount_minor_units, currency, external_order_ref)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (account_id, course_id) WHERE status = 'pending' DO NOTHING
             RETURNING {PURCHASE_COLUMNS}"
        ))
        .bind(new.account_id)
        .bind(new.course_id)
        .bind(new.amount.minor_units)
        .bind(new.amount.currency.code())
        .bind(&new.external_order_ref)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(PendingPurchase::Created(row.into_domain()?));
        }

        let existing = self
            .find_by_status(new.account_id, new.course_id, PurchaseStatus::Pending)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(
                    "pending purchase conflicted but no pending row found".to_owned(),
                )
            })?;

        Ok(PendingPurchase::Existing(existing))
    }

    /// Transition the purchase for `order_ref` out of `Pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail.
    pub async fn settle(
        &self,
        order_ref: &str,
        status: PurchaseStatus,
        payment_ref: Option<&str>,
    ) -> Result<Option<SettledPurchase>, RepositoryError> {
        let updated: Option<PurchaseRow> = sqlx::query_as(&format!(
            "UPDATE purchase
             SET status = $2, external_payment_ref = $3, settled_at = now()
             WHERE external_order_ref = $1 AND status = 'pending'
             RETURNING {PURCHASE_COLUMNS}"
        ))
        .bind(order_ref)
        .bind(status)
        .bind(payment_ref)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(Some(SettledPurchase {
                purchase: row.into_domain()?,
                already_settled: false,
            }));
        }

        // Zero rows: either the order ref is unknown or the purchase is
        // already terminal (duplicate delivery). Distinguish by reading.
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchase WHERE external_order_ref = $1"
        ))
        .bind(order_ref)
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            Ok(SettledPurchase {
                purchase: row.into_domain()?,
                already_settled: true,
            })
        })
        .transpose()
    }
}
