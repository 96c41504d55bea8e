//! Account lifecycle webhooks mirrored through the HTTP surface.

use axum::http::StatusCode;
use serde_json::json;

use chalkbox_integration_tests::{LEARNER_TOKEN, TestContext};

#[tokio::test]
async fn created_events_make_the_token_resolvable() {
    let ctx = TestContext::new();

    // Token is valid at the provider but has no local mirror yet.
    let (status, _) = ctx.get_auth("/api/me", LEARNER_TOKEN).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .post_auth_webhook(&json!({
            "type": "user.created",
            "data": { "id": "user_learner", "email": "learner@example.com" },
        }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.get_auth("/api/me", LEARNER_TOKEN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "learner@example.com");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn updated_events_change_the_mirrored_email() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;

    let (status, _) = ctx
        .post_auth_webhook(&json!({
            "type": "user.updated",
            "data": { "id": "user_learner", "email": "renamed@example.com" },
        }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx.get_auth("/api/me", LEARNER_TOKEN).await;
    assert_eq!(body["email"], "renamed@example.com");
}

#[tokio::test]
async fn deleted_events_remove_the_mirror() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;

    let (status, _) = ctx
        .post_auth_webhook(&json!({
            "type": "user.deleted",
            "data": { "id": "user_learner" },
        }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.get_auth("/api/me", LEARNER_TOKEN).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lifecycle_webhooks_verify_signatures() {
    let ctx = TestContext::new();

    let body = serde_json::to_vec(&json!({
        "type": "user.created",
        "data": { "id": "user_learner", "email": "learner@example.com" },
    }))
    .expect("encode");

    let (status, _) = ctx
        .post_webhook("/webhooks/auth", "x-auth-signature", "deadbeef", body)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_event_kinds_are_validation_errors() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .post_auth_webhook(&json!({
            "type": "user.merged",
            "data": { "id": "user_learner" },
        }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_emails_in_events_are_validation_errors() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .post_auth_webhook(&json!({
            "type": "user.created",
            "data": { "id": "user_learner", "email": "not-an-email" },
        }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
