//! Public blog routes.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::error::{AppError, Result};
use crate::models::BlogPost;
use crate::state::AppState;

/// GET /api/blog
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>> {
    Ok(Json(state.store().list_published_posts().await?))
}

/// GET /api/blog/{slug}
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>> {
    state
        .store()
        .post_by_slug(&slug)
        .await?
        .filter(|post| post.is_published)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("post not found".to_owned()))
}
