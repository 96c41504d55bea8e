//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Catalog (public)
//! GET  /api/courses                     - Published courses
//! GET  /api/courses/{slug}              - Course detail with modules
//! GET  /api/courses/{slug}/access       - Access decision (optional auth)
//! GET  /api/courses/{slug}/modules/{id} - Gated module content
//!
//! # Ledger (requires auth)
//! POST /api/courses/{slug}/enroll       - Enroll in a course
//! POST /api/courses/{slug}/purchase     - Begin (or resume) a purchase
//! GET  /api/me                          - Current account
//! GET  /api/me/enrollments              - Enrollments of the current account
//!
//! # Blog (public)
//! GET  /api/blog                        - Published posts
//! GET  /api/blog/{slug}                 - Post detail
//!
//! # Webhooks (signature-verified)
//! POST /webhooks/payments               - Gateway settlement notifications
//! POST /webhooks/auth                   - Auth provider lifecycle events
//!
//! # Admin (requires admin role)
//! POST   /api/admin/courses
//! PATCH  /api/admin/courses/{id}
//! DELETE /api/admin/courses/{id}
//! POST   /api/admin/courses/{id}/modules
//! PUT    /api/admin/courses/{id}/modules/order
//! PATCH  /api/admin/modules/{id}
//! DELETE /api/admin/modules/{id}
//! POST   /api/admin/modules/{id}/contents
//! POST   /api/admin/blog
//! PATCH  /api/admin/blog/{id}
//! DELETE /api/admin/blog/{id}
//! PUT    /api/admin/accounts/{id}/role
//! ```

pub mod admin;
pub mod blog;
pub mod courses;
pub mod purchases;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the public course routes router.
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(courses::index))
        .route("/{slug}", get(courses::show))
        .route("/{slug}/access", get(courses::access))
        .route("/{slug}/modules/{module_id}", get(courses::module_detail))
        .route("/{slug}/enroll", post(purchases::enroll))
        .route("/{slug}/purchase", post(purchases::begin_purchase))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/{slug}", get(blog::show))
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(webhooks::payments))
        .route("/auth", post(webhooks::auth))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", post(admin::create_course))
        .route(
            "/courses/{id}",
            axum::routing::patch(admin::update_course).delete(admin::delete_course),
        )
        .route("/courses/{id}/modules", post(admin::create_module))
        .route("/courses/{id}/modules/order", put(admin::reorder_modules))
        .route(
            "/modules/{id}",
            axum::routing::patch(admin::update_module).delete(admin::delete_module),
        )
        .route("/modules/{id}/contents", post(admin::create_module_content))
        .route("/blog", post(admin::create_post))
        .route(
            "/blog/{id}",
            axum::routing::patch(admin::update_post).delete(admin::delete_post),
        )
        .route("/accounts/{id}/role", put(admin::set_account_role))
}

/// Build the full application router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/courses", course_routes())
        .nest("/api/blog", blog_routes())
        .nest("/webhooks", webhook_routes())
        .nest("/api/admin", admin_routes())
        .route("/api/me", get(purchases::me))
        .route("/api/me/enrollments", get(purchases::my_enrollments))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}
