//! Blog post repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use chalkbox_core::BlogPostId;

use super::RepositoryError;
use super::courses::map_unique_violation;
use crate::models::{BlogPost, BlogPostUpdate, NewBlogPost};

#[derive(sqlx::FromRow)]
struct BlogPostRow {
    id: i32,
    slug: String,
    title: String,
    body: String,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BlogPostRow {
    fn into_domain(self) -> BlogPost {
        BlogPost {
            id: BlogPostId::new(self.id),
            slug: self.slug,
            title: self.title,
            body: self.body,
            is_published: self.is_published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const POST_COLUMNS: &str = "id, slug, title, body, is_published, created_at, updated_at";

/// Repository for blog post database operations.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    /// Create a new blog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let rows: Vec<BlogPostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM blog_post WHERE is_published ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(BlogPostRow::into_domain).collect())
    }

    /// Get a post by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let row: Option<BlogPostRow> =
            sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM blog_post WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(BlogPostRow::into_domain))
    }

    /// Create a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: NewBlogPost) -> Result<BlogPost, RepositoryError> {
        let row: BlogPostRow = sqlx::query_as(&format!(
            "INSERT INTO blog_post (slug, title, body, is_published)
             VALUES ($1, $2, $3, $4)
             RETURNING {POST_COLUMNS}"
        ))
        .bind(&new.slug)
        .bind(&new.title)
        .bind(&new.body)
        .bind(new.is_published)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "blog post slug already exists"))?;

        Ok(row.into_domain())
    }

    /// Apply a partial update to a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: BlogPostId,
        update: BlogPostUpdate,
    ) -> Result<Option<BlogPost>, RepositoryError> {
        let row: Option<BlogPostRow> = sqlx::query_as(&format!(
            "UPDATE blog_post
             SET title = COALESCE($2, title),
                 body = COALESCE($3, body),
                 is_published = COALESCE($4, is_published),
                 updated_at = now()
             WHERE id = $1
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.body)
        .bind(update.is_published)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(BlogPostRow::into_domain))
    }

    /// Delete a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: BlogPostId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM blog_post WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
