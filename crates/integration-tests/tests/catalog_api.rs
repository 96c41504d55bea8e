//! Public catalog and blog routes.

use axum::http::StatusCode;
use chalkbox_server::db::Store;
use chalkbox_server::models::{CourseUpdate, NewBlogPost};
use serde_json::json;

use chalkbox_integration_tests::TestContext;

#[tokio::test]
async fn health_answers() {
    let ctx = TestContext::new();
    let (status, _) = ctx.get("/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn course_list_shows_published_courses_only() {
    let ctx = TestContext::new();
    ctx.seed_course("visible", 9_900).await;
    let draft = ctx.seed_course("draft", 9_900).await;
    ctx.store
        .update_course(
            draft.id,
            CourseUpdate {
                is_published: Some(false),
                ..CourseUpdate::default()
            },
        )
        .await
        .expect("unpublish");

    let (status, body) = ctx.get("/api/courses").await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|c| c["slug"].as_str())
        .collect();
    assert_eq!(slugs, vec!["visible"]);
}

#[tokio::test]
async fn course_detail_includes_ordered_modules() {
    let ctx = TestContext::new();
    let course = ctx.seed_course("rust-101", 49_900).await;
    ctx.seed_module(&course, "Intro", true).await;
    ctx.seed_module(&course, "Ownership", false).await;

    let (status, body) = ctx.get("/api/courses/rust-101").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"]["slug"], "rust-101");
    assert_eq!(body["modules"].as_array().expect("modules").len(), 2);
}

#[tokio::test]
async fn unknown_course_is_404() {
    let ctx = TestContext::new();
    let (status, body) = ctx.get("/api/courses/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "course not found");
}

#[tokio::test]
async fn blog_routes_serve_published_posts() {
    let ctx = TestContext::new();
    ctx.store
        .create_post(NewBlogPost {
            slug: "welcome".to_owned(),
            title: "Welcome".to_owned(),
            body: "Hello".to_owned(),
            is_published: true,
        })
        .await
        .expect("post");
    ctx.store
        .create_post(NewBlogPost {
            slug: "draft".to_owned(),
            title: "Draft".to_owned(),
            body: "Unfinished".to_owned(),
            is_published: false,
        })
        .await
        .expect("post");

    let (status, body) = ctx.get("/api/blog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 1);

    let (status, body) = ctx.get("/api/blog/welcome").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Welcome");

    let (status, _) = ctx.get("/api/blog/draft").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn price_serializes_in_minor_units() {
    let ctx = TestContext::new();
    ctx.seed_course("priced", 49_900).await;

    let (_, body) = ctx.get("/api/courses/priced").await;
    assert_eq!(body["course"]["price"]["minorUnits"], json!(49_900));
}
