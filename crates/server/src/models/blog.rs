//! Blog post domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chalkbox_core::BlogPostId;

/// A blog post. Only published posts are visible on the public routes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: BlogPostId,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a blog post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPost {
    pub slug: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub is_published: bool,
}

/// Partial update of a blog post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub is_published: Option<bool>,
}
