//! Enrollment repository.
//!
//! The `UNIQUE (account_id, course_id)` constraint is the authority on
//! duplicate enrollment; `create` inserts and maps the violation instead of
//! checking first.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use chalkbox_core::{AccountId, CourseId, EnrollmentId};

use super::RepositoryError;
use super::courses::map_unique_violation;
use crate::models::Enrollment;

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    id: i32,
    account_id: i32,
    course_id: i32,
    created_at: DateTime<Utc>,
}

impl EnrollmentRow {
    fn into_domain(self) -> Enrollment {
        Enrollment {
            id: EnrollmentId::new(self.id),
            account_id: AccountId::new(self.account_id),
            course_id: CourseId::new(self.course_id),
            created_at: self.created_at,
        }
    }
}

const ENROLLMENT_COLUMNS: &str = "id, account_id, course_id, created_at";

/// Repository for enrollment database operations.
pub struct EnrollmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EnrollmentRepository<'a> {
    /// Create a new enrollment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether (account, course) is enrolled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<bool, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM enrollment WHERE account_id = $1 AND course_id = $2",
        )
        .bind(account_id)
        .bind(course_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Insert an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the pair is already enrolled.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Enrollment, RepositoryError> {
        let row: EnrollmentRow = sqlx::query_as(&format!(
            "INSERT INTO enrollment (account_id, course_id)
             VALUES ($1, $2)
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(account_id)
        .bind(course_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "already enrolled in this course"))?;

        Ok(row.into_domain())
    }

    /// All enrollments of an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        let rows: Vec<EnrollmentRow> = sqlx::query_as(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollment
             WHERE account_id = $1 ORDER BY created_at DESC"
        ))
        .bind(account_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(EnrollmentRow::into_domain).collect())
    }

    /// Get an enrollment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: EnrollmentId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let row: Option<EnrollmentRow> = sqlx::query_as(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollment WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(EnrollmentRow::into_domain))
    }
}
