//! Course catalog repository: courses, modules, and module contents.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use chalkbox_core::{CourseId, CurrencyCode, ModuleId, Price};

use super::RepositoryError;
use crate::models::{
    Course, CourseUpdate, Module, ModuleContent, ModuleContentKind, ModuleUpdate, NewCourse,
    NewModule, NewModuleContent,
};

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: i32,
    slug: String,
    title: String,
    description: String,
    price_minor_units: i64,
    currency: String,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CourseRow {
    fn into_domain(self) -> Result<Course, RepositoryError> {
        let currency = CurrencyCode::from_str(&self.currency)
            .map_err(|e| RepositoryError::DataCorruption(format!("course {}: {e}", self.id)))?;

        Ok(Course {
            id: CourseId::new(self.id),
            slug: self.slug,
            title: self.title,
            description: self.description,
            price: Price::from_minor_units(self.price_minor_units, currency),
            is_published: self.is_published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ModuleRow {
    id: i32,
    course_id: i32,
    title: String,
    is_free: bool,
    position: i32,
}

impl ModuleRow {
    fn into_domain(self) -> Module {
        Module {
            id: ModuleId::new(self.id),
            course_id: CourseId::new(self.course_id),
            title: self.title,
            is_free: self.is_free,
            position: self.position,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ModuleContentRow {
    id: i32,
    module_id: i32,
    kind: ModuleContentKind,
    title: String,
    body: String,
    position: i32,
}

impl ModuleContentRow {
    fn into_domain(self) -> ModuleContent {
        ModuleContent {
            id: self.id,
            module_id: ModuleId::new(self.module_id),
            kind: self.kind,
            title: self.title,
            body: self.body,
            position: self.position,
        }
    }
}

const COURSE_COLUMNS: &str =
    "id, slug, title, description, price_minor_units, currency, is_published, created_at, updated_at";
const MODULE_COLUMNS: &str = "id, course_id, title, is_free, position";
const CONTENT_COLUMNS: &str = "id, module_id, kind, title, body, position";

/// Repository for catalog database operations.
pub struct CourseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CourseRepository<'a> {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All published courses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self) -> Result<Vec<Course>, RepositoryError> {
        let rows: Vec<CourseRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS} FROM course WHERE is_published ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CourseRow::into_domain).collect()
    }

    /// Get a course by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Course>, RepositoryError> {
        let row: Option<CourseRow> =
            sqlx::query_as(&format!("SELECT {COURSE_COLUMNS} FROM course WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;

        row.map(CourseRow::into_domain).transpose()
    }

    /// Get a course by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
        let row: Option<CourseRow> =
            sqlx::query_as(&format!("SELECT {COURSE_COLUMNS} FROM course WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(CourseRow::into_domain).transpose()
    }

    /// Modules of a course in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, RepositoryError> {
        let rows: Vec<ModuleRow> = sqlx::query_as(&format!(
            "SELECT {MODULE_COLUMNS} FROM module WHERE course_id = $1 ORDER BY position, id"
        ))
        .bind(course_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ModuleRow::into_domain).collect())
    }

    /// Get a module by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, RepositoryError> {
        let row: Option<ModuleRow> =
            sqlx::query_as(&format!("SELECT {MODULE_COLUMNS} FROM module WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(ModuleRow::into_domain))
    }

    /// Contents of a module in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_module_contents(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<ModuleContent>, RepositoryError> {
        let rows: Vec<ModuleContentRow> = sqlx::query_as(&format!(
            "SELECT {CONTENT_COLUMNS} FROM module_content WHERE module_id = $1 ORDER BY position, id"
        ))
        .bind(module_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ModuleContentRow::into_domain).collect())
    }

    /// Create a course.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: NewCourse) -> Result<Course, RepositoryError> {
        let row: CourseRow = sqlx::query_as(&format!(
            "INSERT INTO course (slug, title, description, price_minor_units, currency, is_published)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(&new.slug)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.price.minor_units)
        .bind(new.price.currency.code())
        .bind(new.is_published)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "course slug already exists"))?;

        row.into_domain()
    }

    /// Apply a partial update to a course.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug of a published course
    /// is changed, or if the new slug collides with another course.
    pub async fn update(
        &self,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Option<Course>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<CourseRow> =
            sqlx::query_as(&format!("SELECT {COURSE_COLUMNS} FROM course WHERE id = $1 FOR UPDATE"))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(current) = current else {
            return Ok(None);
        };

        // Slugs freeze at publication; published URLs must keep resolving.
        if let Some(ref slug) = update.slug
            && current.is_published
            && *slug != current.slug
        {
            return Err(RepositoryError::Conflict(
                "slug is immutable once the course is published".to_owned(),
            ));
        }

        let slug = update.slug.unwrap_or(current.slug);
        let title = update.title.unwrap_or(current.title);
        let description = update.description.unwrap_or(current.description);
        let (price_minor_units, currency) = update.price.map_or(
            (current.price_minor_units, current.currency),
            |p| (p.minor_units, p.currency.code().to_owned()),
        );
        let is_published = update.is_published.unwrap_or(current.is_published);

        let row: CourseRow = sqlx::query_as(&format!(
            "UPDATE course
             SET slug = $2, title = $3, description = $4, price_minor_units = $5,
                 currency = $6, is_published = $7, updated_at = now()
             WHERE id = $1
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(&slug)
        .bind(&title)
        .bind(&description)
        .bind(price_minor_units)
        .bind(&currency)
        .bind(is_published)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "course slug already exists"))?;

        tx.commit().await?;
        row.into_domain().map(Some)
    }

    /// Delete a course; modules, contents, enrollments, purchases cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CourseId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM course WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Create a module under a course.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including an
    /// unknown course id, which violates the foreign key).
    pub async fn create_module(
        &self,
        course_id: CourseId,
        new: NewModule,
    ) -> Result<Module, RepositoryError> {
        let row: ModuleRow = sqlx::query_as(&format!(
            "INSERT INTO module (course_id, title, is_free, position)
             VALUES ($1, $2, $3, $4)
             RETURNING {MODULE_COLUMNS}"
        ))
        .bind(course_id)
        .bind(&new.title)
        .bind(new.is_free)
        .bind(new.position)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_domain())
    }

    /// Apply a partial update to a module.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_module(
        &self,
        id: ModuleId,
        update: ModuleUpdate,
    ) -> Result<Option<Module>, RepositoryError> {
        let row: Option<ModuleRow> = sqlx::query_as(&format!(
            "UPDATE module
             SET title = COALESCE($2, title),
                 is_free = COALESCE($3, is_free),
                 position = COALESCE($4, position)
             WHERE id = $1
             RETURNING {MODULE_COLUMNS}"
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.is_free)
        .bind(update.position)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ModuleRow::into_domain))
    }

    /// Delete a module and its contents.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_module(&self, id: ModuleId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM module WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rewrite module positions to match `order`, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `order` does not name exactly
    /// the modules of the course (the whole reorder is rolled back).
    pub async fn reorder_modules(
        &self,
        course_id: CourseId,
        order: &[ModuleId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Vec<(i32,)> =
            sqlx::query_as("SELECT id FROM module WHERE course_id = $1 FOR UPDATE")
                .bind(course_id)
                .fetch_all(&mut *tx)
                .await?;

        let mut expected: Vec<i32> = existing.into_iter().map(|(id,)| id).collect();
        let mut requested: Vec<i32> = order.iter().map(|id| id.as_i32()).collect();
        expected.sort_unstable();
        requested.sort_unstable();
        if expected != requested {
            return Err(RepositoryError::Conflict(
                "reorder must name exactly the modules of the course".to_owned(),
            ));
        }

        for (position, module_id) in (0i32..).zip(order.iter()) {
            sqlx::query("UPDATE module SET position = $2 WHERE id = $1")
                .bind(module_id)
                .bind(position)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Add content to a module.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_module_content(
        &self,
        module_id: ModuleId,
        new: NewModuleContent,
    ) -> Result<ModuleContent, RepositoryError> {
        let row: ModuleContentRow = sqlx::query_as(&format!(
            "INSERT INTO module_content (module_id, kind, title, body, position)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CONTENT_COLUMNS}"
        ))
        .bind(module_id)
        .bind(new.kind)
        .bind(&new.title)
        .bind(&new.body)
        .bind(new.position)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_domain())
    }
}

pub(super) fn map_unique_violation(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
