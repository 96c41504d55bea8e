//! Admin surface: authorization, catalog CRUD, cache invalidation.

use axum::http::StatusCode;
use serde_json::json;

use chalkbox_integration_tests::{ADMIN_TOKEN, LEARNER_TOKEN, TestContext};

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let ctx = TestContext::new();
    ctx.seed_learner().await;

    let payload = json!({
        "slug": "new-course",
        "title": "New Course",
        "price": { "minorUnits": 9_900, "currency": "INR" },
    });

    let (status, _) = ctx
        .post_auth("/api/admin/courses", LEARNER_TOKEN, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .post_auth("/api/admin/courses", "tok_bogus", Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_courses_appear_in_the_public_catalog() {
    let ctx = TestContext::new();
    ctx.seed_admin().await;

    // Warm the catalog cache while it is empty.
    let (_, body) = ctx.get("/api/courses").await;
    assert_eq!(body.as_array().expect("array").len(), 0);

    let (status, created) = ctx
        .post_auth(
            "/api/admin/courses",
            ADMIN_TOKEN,
            Some(json!({
                "slug": "algebra",
                "title": "Algebra",
                "price": { "minorUnits": 19_900, "currency": "INR" },
                "isPublished": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "algebra");

    // The mutation invalidated the cached empty list.
    let (_, body) = ctx.get("/api/courses").await;
    assert_eq!(body.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn duplicate_slugs_conflict() {
    let ctx = TestContext::new();
    ctx.seed_admin().await;
    ctx.seed_course("algebra", 19_900).await;

    let (status, _) = ctx
        .post_auth(
            "/api/admin/courses",
            ADMIN_TOKEN,
            Some(json!({
                "slug": "algebra",
                "title": "Algebra Again",
                "price": { "minorUnits": 19_900, "currency": "INR" },
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn published_course_slugs_are_frozen() {
    let ctx = TestContext::new();
    ctx.seed_admin().await;
    let course = ctx.seed_course("algebra", 19_900).await;

    let (status, _) = ctx
        .patch_auth(
            &format!("/api/admin/courses/{}", course.id),
            ADMIN_TOKEN,
            json!({ "slug": "renamed" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Other fields still update.
    let (status, updated) = ctx
        .patch_auth(
            &format!("/api/admin/courses/{}", course.id),
            ADMIN_TOKEN,
            json!({ "title": "Algebra II" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Algebra II");
}

#[tokio::test]
async fn modules_reorder_all_or_nothing() {
    let ctx = TestContext::new();
    ctx.seed_admin().await;
    let course = ctx.seed_course("algebra", 19_900).await;
    let a = ctx.seed_module(&course, "A", true).await;
    let b = ctx.seed_module(&course, "B", false).await;

    let (status, _) = ctx
        .put_auth(
            &format!("/api/admin/courses/{}/modules/order", course.id),
            ADMIN_TOKEN,
            json!({ "order": [b.id, a.id] }),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, detail) = ctx.get("/api/courses/algebra").await;
    let titles: Vec<&str> = detail["modules"]
        .as_array()
        .expect("modules")
        .iter()
        .filter_map(|m| m["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["B", "A"]);

    // An order that does not name every module is rejected.
    let (status, _) = ctx
        .put_auth(
            &format!("/api/admin/courses/{}/modules/order", course.id),
            ADMIN_TOKEN,
            json!({ "order": [a.id] }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn module_contents_are_created_under_a_module() {
    let ctx = TestContext::new();
    ctx.seed_admin().await;
    ctx.seed_learner().await;
    let course = ctx.seed_course("algebra", 0).await;
    let module = ctx.seed_module(&course, "Numbers", true).await;

    let (status, content) = ctx
        .post_auth(
            &format!("/api/admin/modules/{}/contents", module.id),
            ADMIN_TOKEN,
            Some(json!({
                "kind": "lesson",
                "title": "Counting",
                "body": "One, two, three.",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(content["kind"], "lesson");

    ctx.post_auth("/api/courses/algebra/enroll", LEARNER_TOKEN, None)
        .await;
    let (_, detail) = ctx
        .get_auth(
            &format!("/api/courses/algebra/modules/{}", module.id),
            LEARNER_TOKEN,
        )
        .await;
    assert_eq!(detail["contents"].as_array().expect("contents").len(), 1);
}

#[tokio::test]
async fn blog_crud_round_trips() {
    let ctx = TestContext::new();
    ctx.seed_admin().await;

    let (status, post) = ctx
        .post_auth(
            "/api/admin/blog",
            ADMIN_TOKEN,
            Some(json!({
                "slug": "news",
                "title": "News",
                "body": "Things happened.",
                "isPublished": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = post["id"].as_i64().expect("id");

    let (status, updated) = ctx
        .patch_auth(
            &format!("/api/admin/blog/{id}"),
            ADMIN_TOKEN,
            json!({ "title": "Updated News" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Updated News");

    let (status, _) = ctx
        .delete_auth(&format!("/api/admin/blog/{id}"), ADMIN_TOKEN)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.get("/api/blog/news").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_changes_take_effect() {
    let ctx = TestContext::new();
    ctx.seed_admin().await;
    let learner = ctx.seed_learner().await;

    let (status, updated) = ctx
        .put_auth(
            &format!("/api/admin/accounts/{}/role", learner.id),
            ADMIN_TOKEN,
            json!({ "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "admin");

    // The promoted account can now hit admin routes.
    let (status, _) = ctx
        .post_auth(
            "/api/admin/blog",
            LEARNER_TOKEN,
            Some(json!({ "slug": "p", "title": "P", "body": "B" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}
