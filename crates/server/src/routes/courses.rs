//! Public catalog and access routes.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use chalkbox_core::{ModuleId, entitlement::AccessDecision};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAccount;
use crate::models::{Course, Module, ModuleContent};
use crate::services::CourseDetail;
use crate::state::AppState;

/// GET /api/courses
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Course>>> {
    Ok(Json(state.catalog().list_courses().await?))
}

/// GET /api/courses/{slug}
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CourseDetail>> {
    Ok(Json(state.catalog().course_detail(&slug).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessQuery {
    /// Narrow the decision to one module.
    pub module_id: Option<ModuleId>,
}

/// GET /api/courses/{slug}/access
///
/// Anonymous callers get an all-false decision rather than a 401, so the
/// client can render locked state without a login roundtrip.
pub async fn access(
    State(state): State<AppState>,
    OptionalAccount(account): OptionalAccount,
    Path(slug): Path<String>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessDecision>> {
    let decision = state
        .entitlements()
        .evaluate_access(account.map(|a| a.id), &slug, query.module_id)
        .await?;
    Ok(Json(decision))
}

/// A module and its gated contents.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetail {
    pub module: Module,
    pub contents: Vec<ModuleContent>,
}

/// GET /api/courses/{slug}/modules/{module_id}
///
/// Content is gated: anonymous callers get 401, enrolled-but-unpaid
/// callers get 403 for paid modules.
pub async fn module_detail(
    State(state): State<AppState>,
    OptionalAccount(account): OptionalAccount,
    Path((slug, module_id)): Path<(String, ModuleId)>,
) -> Result<Json<ModuleDetail>> {
    let decision = state
        .entitlements()
        .evaluate_access(account.as_ref().map(|a| a.id), &slug, Some(module_id))
        .await?;

    if !decision.has_module_access {
        return Err(match account {
            None => AppError::Unauthorized("authentication required".to_owned()),
            Some(_) => AppError::Forbidden("module is locked".to_owned()),
        });
    }

    let module = state
        .store()
        .module_by_id(module_id)
        .await?
        .ok_or_else(|| AppError::NotFound("module not found".to_owned()))?;
    let contents = state.store().list_module_contents(module_id).await?;

    Ok(Json(ModuleDetail { module, contents }))
}
