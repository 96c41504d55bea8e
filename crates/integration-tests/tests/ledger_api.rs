//! Enrollment, purchase, and settlement flows through the HTTP surface.

use axum::http::StatusCode;
use serde_json::json;

use chalkbox_integration_tests::{LEARNER_TOKEN, TestContext};

#[tokio::test]
async fn enroll_requires_authentication() {
    let ctx = TestContext::new();
    ctx.seed_course("rust-101", 49_900).await;

    let (status, _) = ctx.post_auth("/api/courses/rust-101/enroll", "tok_bogus", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn enroll_creates_once_and_conflicts_after() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    ctx.seed_course("rust-101", 49_900).await;

    let (status, body) = ctx
        .post_auth("/api/courses/rust-101/enroll", LEARNER_TOKEN, None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_number());

    let (status, _) = ctx
        .post_auth("/api/courses/rust-101/enroll", LEARNER_TOKEN, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = ctx.get_auth("/api/me/enrollments", LEARNER_TOKEN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn purchase_flow_settles_via_webhook() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    ctx.seed_course("rust-101", 49_900).await;
    ctx.post_auth("/api/courses/rust-101/enroll", LEARNER_TOKEN, None)
        .await;

    let (status, intent) = ctx
        .post_auth("/api/courses/rust-101/purchase", LEARNER_TOKEN, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let order_ref = intent["orderRef"].as_str().expect("order ref").to_owned();
    assert_eq!(intent["amount"]["minorUnits"], json!(49_900));

    // Retry returns the same order reference.
    let (_, retry) = ctx
        .post_auth("/api/courses/rust-101/purchase", LEARNER_TOKEN, None)
        .await;
    assert_eq!(retry["orderRef"], json!(order_ref.clone()));

    let (status, _) = ctx
        .post_payment_webhook(&json!({
            "event": "payment.captured",
            "orderRef": order_ref,
            "paymentRef": "pay_1",
        }))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Paid: the full course is now accessible.
    let (_, decision) = ctx
        .get_auth("/api/courses/rust-101/access", LEARNER_TOKEN)
        .await;
    assert_eq!(decision["hasPaid"], json!(true));
    assert_eq!(decision["hasFullCourseAccess"], json!(true));

    // Further purchase attempts conflict.
    let (status, _) = ctx
        .post_auth("/api/courses/rust-101/purchase", LEARNER_TOKEN, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn duplicate_settlement_deliveries_are_accepted() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    ctx.seed_course("rust-101", 49_900).await;

    let (_, intent) = ctx
        .post_auth("/api/courses/rust-101/purchase", LEARNER_TOKEN, None)
        .await;
    let payload = json!({
        "event": "payment.captured",
        "orderRef": intent["orderRef"],
        "paymentRef": "pay_1",
    });

    let (first, _) = ctx.post_payment_webhook(&payload).await;
    let (second, _) = ctx.post_payment_webhook(&payload).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
}

#[tokio::test]
async fn failed_settlement_allows_a_fresh_purchase() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    ctx.seed_course("rust-101", 49_900).await;

    let (_, first) = ctx
        .post_auth("/api/courses/rust-101/purchase", LEARNER_TOKEN, None)
        .await;
    ctx.post_payment_webhook(&json!({
        "event": "payment.failed",
        "orderRef": first["orderRef"],
    }))
    .await;

    let (status, second) = ctx
        .post_auth("/api/courses/rust-101/purchase", LEARNER_TOKEN, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(second["orderRef"], first["orderRef"]);
}

#[tokio::test]
async fn free_courses_cannot_be_purchased() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    ctx.seed_course("free-intro", 0).await;

    let (status, _) = ctx
        .post_auth("/api/courses/free-intro/purchase", LEARNER_TOKEN, None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn webhooks_reject_bad_signatures() {
    let ctx = TestContext::new();

    let body = serde_json::to_vec(&json!({
        "event": "payment.captured",
        "orderRef": "order_1",
    }))
    .expect("encode");

    let (status, _) = ctx
        .post_webhook("/webhooks/payments", "x-gateway-signature", "deadbeef", body.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Missing header entirely.
    let (status, _) = ctx
        .post_webhook("/webhooks/payments", "x-unrelated", "deadbeef", body)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn settlement_for_an_unknown_order_is_404() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .post_payment_webhook(&json!({
            "event": "payment.captured",
            "orderRef": "order_unknown",
        }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_settlement_payloads_are_validation_errors() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .post_payment_webhook(&json!({
            "event": "payment.refunded",
            "orderRef": "order_1",
        }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
