//! Access decisions and content gating through the HTTP surface.

use axum::http::StatusCode;
use serde_json::json;

use chalkbox_integration_tests::{LEARNER_TOKEN, OTHER_TOKEN, TestContext};

#[tokio::test]
async fn anonymous_access_check_is_all_false() {
    let ctx = TestContext::new();
    ctx.seed_course("rust-101", 49_900).await;

    let (status, decision) = ctx.get("/api/courses/rust-101/access").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision["isEnrolled"], json!(false));
    assert_eq!(decision["hasModuleAccess"], json!(false));
    assert_eq!(decision["hasFullCourseAccess"], json!(false));
}

#[tokio::test]
async fn enrollment_grants_the_partial_tier_only() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    let course = ctx.seed_course("rust-101", 49_900).await;
    let free = ctx.seed_module(&course, "Intro", true).await;
    let paid = ctx.seed_module(&course, "Ownership", false).await;

    ctx.post_auth("/api/courses/rust-101/enroll", LEARNER_TOKEN, None)
        .await;

    let (_, decision) = ctx
        .get_auth(
            &format!("/api/courses/rust-101/access?moduleId={}", free.id),
            LEARNER_TOKEN,
        )
        .await;
    assert_eq!(decision["hasModuleAccess"], json!(true));
    assert_eq!(decision["hasFullCourseAccess"], json!(false));

    let (_, decision) = ctx
        .get_auth(
            &format!("/api/courses/rust-101/access?moduleId={}", paid.id),
            LEARNER_TOKEN,
        )
        .await;
    assert_eq!(decision["hasModuleAccess"], json!(false));
}

#[tokio::test]
async fn zero_price_courses_unlock_fully_on_enrollment() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    let course = ctx.seed_course("free-intro", 0).await;
    ctx.seed_module(&course, "Everything", false).await;

    ctx.post_auth("/api/courses/free-intro/enroll", LEARNER_TOKEN, None)
        .await;

    let (_, decision) = ctx
        .get_auth("/api/courses/free-intro/access", LEARNER_TOKEN)
        .await;
    assert_eq!(decision["hasFullCourseAccess"], json!(true));
}

#[tokio::test]
async fn module_content_is_gated_by_tier() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    ctx.seed_other().await;
    let course = ctx.seed_course("rust-101", 49_900).await;
    let free = ctx.seed_module(&course, "Intro", true).await;
    let paid = ctx.seed_module(&course, "Ownership", false).await;

    ctx.post_auth("/api/courses/rust-101/enroll", LEARNER_TOKEN, None)
        .await;

    // Anonymous: 401 on everything.
    let (status, _) = ctx
        .get(&format!("/api/courses/rust-101/modules/{}", free.id))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Enrolled: free module opens, paid module is forbidden.
    let (status, body) = ctx
        .get_auth(
            &format!("/api/courses/rust-101/modules/{}", free.id),
            LEARNER_TOKEN,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["module"]["title"], "Intro");

    let (status, _) = ctx
        .get_auth(
            &format!("/api/courses/rust-101/modules/{}", paid.id),
            LEARNER_TOKEN,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Authenticated but unenrolled: forbidden even for the free module.
    let (status, _) = ctx
        .get_auth(
            &format!("/api/courses/rust-101/modules/{}", free.id),
            OTHER_TOKEN,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn module_from_another_course_is_404() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;
    ctx.seed_course("rust-101", 49_900).await;
    let other = ctx.seed_course("other", 0).await;
    let stray = ctx.seed_module(&other, "Stray", true).await;

    let (status, _) = ctx
        .get_auth(
            &format!("/api/courses/rust-101/access?moduleId={}", stray.id),
            LEARNER_TOKEN,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_reports_the_current_account() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;

    let (status, body) = ctx.get_auth("/api/me", LEARNER_TOKEN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["externalId"], "user_learner");
    assert_eq!(body["email"], "learner@example.com");

    let (status, _) = ctx.get("/api/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
