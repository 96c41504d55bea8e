//! Course catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chalkbox_core::{CourseId, ModuleId, Price};

/// A course in the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    /// URL slug, unique. Immutable once the course is published.
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Price in minor units. Zero means enrollment alone grants full access.
    pub price: Price,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A module of a course.
///
/// `position` defines display order within the course. Duplicate positions
/// are tolerated; listings sort by `(position, id)` so the order is stable
/// regardless.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    /// Free modules are unlocked by enrollment alone.
    pub is_free: bool,
    pub position: i32,
}

/// The kind of a piece of module content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "module_content_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModuleContentKind {
    Lesson,
    Quiz,
    PastQuestion,
}

/// A piece of gated content belonging to a module.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleContent {
    pub id: i32,
    pub module_id: ModuleId,
    pub kind: ModuleContentKind,
    pub title: String,
    pub body: String,
    pub position: i32,
}

/// Fields for creating a course.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub is_published: bool,
}

/// Partial update of a course. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub is_published: Option<bool>,
}

/// Fields for creating a module.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModule {
    pub title: String,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub position: i32,
}

/// Partial update of a module.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleUpdate {
    pub title: Option<String>,
    pub is_free: Option<bool>,
    pub position: Option<i32>,
}

/// Fields for creating module content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModuleContent {
    pub kind: ModuleContentKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub position: i32,
}
