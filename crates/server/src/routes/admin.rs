//! Admin routes. All handlers require the admin role.
//!
//! Catalog mutations invalidate the cached catalog so public reads refetch
//! on the next request.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use chalkbox_core::{AccountId, AccountRole, BlogPostId, CourseId, ModuleId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{
    Account, BlogPost, BlogPostUpdate, Course, CourseUpdate, Module, ModuleContent, ModuleUpdate,
    NewBlogPost, NewCourse, NewModule, NewModuleContent,
};
use crate::state::AppState;

// =============================================================================
// Courses
// =============================================================================

/// POST /api/admin/courses
pub async fn create_course(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(new): Json<NewCourse>,
) -> Result<(StatusCode, Json<Course>)> {
    let course = state.store().create_course(new).await?;
    state.catalog().invalidate();
    Ok((StatusCode::CREATED, Json(course)))
}

/// PATCH /api/admin/courses/{id}
pub async fn update_course(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CourseId>,
    Json(update): Json<CourseUpdate>,
) -> Result<Json<Course>> {
    let course = state
        .store()
        .update_course(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".to_owned()))?;
    state.catalog().invalidate();
    Ok(Json(course))
}

/// DELETE /api/admin/courses/{id}
pub async fn delete_course(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CourseId>,
) -> Result<StatusCode> {
    if !state.store().delete_course(id).await? {
        return Err(AppError::NotFound("course not found".to_owned()));
    }
    state.catalog().invalidate();
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Modules
// =============================================================================

/// POST /api/admin/courses/{id}/modules
pub async fn create_module(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(course_id): Path<CourseId>,
    Json(new): Json<NewModule>,
) -> Result<(StatusCode, Json<Module>)> {
    let module = state.store().create_module(course_id, new).await?;
    state.catalog().invalidate();
    Ok((StatusCode::CREATED, Json(module)))
}

/// PATCH /api/admin/modules/{id}
pub async fn update_module(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ModuleId>,
    Json(update): Json<ModuleUpdate>,
) -> Result<Json<Module>> {
    let module = state
        .store()
        .update_module(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("module not found".to_owned()))?;
    state.catalog().invalidate();
    Ok(Json(module))
}

/// DELETE /api/admin/modules/{id}
pub async fn delete_module(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ModuleId>,
) -> Result<StatusCode> {
    if !state.store().delete_module(id).await? {
        return Err(AppError::NotFound("module not found".to_owned()));
    }
    state.catalog().invalidate();
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// The course's module IDs in their new display order. Must name every
    /// module exactly once.
    pub order: Vec<ModuleId>,
}

/// PUT /api/admin/courses/{id}/modules/order
pub async fn reorder_modules(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(course_id): Path<CourseId>,
    Json(request): Json<ReorderRequest>,
) -> Result<StatusCode> {
    state
        .store()
        .reorder_modules(course_id, &request.order)
        .await?;
    state.catalog().invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/modules/{id}/contents
pub async fn create_module_content(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(module_id): Path<ModuleId>,
    Json(new): Json<NewModuleContent>,
) -> Result<(StatusCode, Json<ModuleContent>)> {
    let content = state.store().create_module_content(module_id, new).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

// =============================================================================
// Blog
// =============================================================================

/// POST /api/admin/blog
pub async fn create_post(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(new): Json<NewBlogPost>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let post = state.store().create_post(new).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PATCH /api/admin/blog/{id}
pub async fn update_post(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<BlogPostId>,
    Json(update): Json<BlogPostUpdate>,
) -> Result<Json<BlogPost>> {
    state
        .store()
        .update_post(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("post not found".to_owned()))
}

/// DELETE /api/admin/blog/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<BlogPostId>,
) -> Result<StatusCode> {
    if !state.store().delete_post(id).await? {
        return Err(AppError::NotFound("post not found".to_owned()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: AccountRole,
}

/// PUT /api/admin/accounts/{id}/role
pub async fn set_account_role(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<AccountId>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<Account>> {
    state
        .store()
        .set_account_role(id, request.role)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("account not found".to_owned()))
}
