//! Enrollment and purchase routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::{AppError, Result};
use crate::middleware::CurrentAccount;
use crate::models::{Course, Enrollment};
use crate::services::PurchaseIntent;
use crate::state::AppState;

/// POST /api/courses/{slug}/enroll
pub async fn enroll(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<Enrollment>)> {
    let course = resolve_course(&state, &slug).await?;
    let enrollment = state.ledger().enroll(account.id, course.id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// POST /api/courses/{slug}/purchase
///
/// Returns the order reference the client hands to the gateway's checkout.
/// Retries while a purchase is pending return the same reference.
pub async fn begin_purchase(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Path(slug): Path<String>,
) -> Result<Json<PurchaseIntent>> {
    let course = resolve_course(&state, &slug).await?;
    let intent = state.ledger().begin_purchase(account.id, course.id).await?;
    Ok(Json(intent))
}

/// GET /api/me/enrollments
pub async fn my_enrollments(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<Json<Vec<Enrollment>>> {
    Ok(Json(state.store().list_enrollments(account.id).await?))
}

/// GET /api/me
pub async fn me(CurrentAccount(account): CurrentAccount) -> Json<crate::models::Account> {
    Json(account)
}

async fn resolve_course(state: &AppState, slug: &str) -> Result<Course> {
    state
        .store()
        .course_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".to_owned()))
}
