//! Integration test harness for Chalkbox.
//!
//! Builds the full application router over the in-memory backends, so the
//! tests under `tests/` exercise routing, extractors, services, and storage
//! together without a database or network. Requests go through
//! `tower::ServiceExt::oneshot` against a cloned router.

#![allow(clippy::expect_used, clippy::missing_panics_doc)] // test support

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use chalkbox_core::{AccountRole, CurrencyCode, Email, Price};
use chalkbox_server::config::{self, ChalkboxConfig};
use chalkbox_server::db::{MemoryStore, Store};
use chalkbox_server::gateway::StaticGateway;
use chalkbox_server::identity::StaticIdentityProvider;
use chalkbox_server::models::{Account, Course, Module, NewCourse, NewModule};
use chalkbox_server::routes;
use chalkbox_server::state::AppState;
use chalkbox_server::webhook;

/// Bearer token the harness maps to the learner identity.
pub const LEARNER_TOKEN: &str = "tok_learner";

/// Bearer token the harness maps to the admin identity.
pub const ADMIN_TOKEN: &str = "tok_admin";

/// Bearer token the harness maps to a second learner identity.
pub const OTHER_TOKEN: &str = "tok_other";

/// A full in-process application with handles to its backends.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<StaticGateway>,
    pub config: ChalkboxConfig,
    app: Router,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Build the application over fresh in-memory backends.
    #[must_use]
    pub fn new() -> Self {
        let config = config::test_config();
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(StaticGateway::new());
        let identity = Arc::new(StaticIdentityProvider::new([
            (LEARNER_TOKEN, "user_learner"),
            (ADMIN_TOKEN, "user_admin"),
            (OTHER_TOKEN, "user_other"),
        ]));

        let state = AppState::new(config.clone(), store.clone(), gateway.clone(), identity);
        let app = routes::router(state);

        Self {
            store,
            gateway,
            config,
            app,
        }
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Mirror the learner identity into the store.
    pub async fn seed_learner(&self) -> Account {
        self.seed_account("user_learner", "learner@example.com").await
    }

    /// Mirror the second learner identity into the store.
    pub async fn seed_other(&self) -> Account {
        self.seed_account("user_other", "other@example.com").await
    }

    /// Mirror the admin identity into the store and grant the admin role.
    pub async fn seed_admin(&self) -> Account {
        let account = self.seed_account("user_admin", "admin@example.com").await;
        self.store
            .set_account_role(account.id, AccountRole::Admin)
            .await
            .expect("set role")
            .expect("account exists")
    }

    async fn seed_account(&self, external_id: &str, email: &str) -> Account {
        let email = Email::parse(email).expect("valid email");
        self.store
            .upsert_account(external_id, &email)
            .await
            .expect("upsert account")
    }

    /// Create a published course.
    pub async fn seed_course(&self, slug: &str, price_minor_units: i64) -> Course {
        self.store
            .create_course(NewCourse {
                slug: slug.to_owned(),
                title: slug.to_owned(),
                description: String::new(),
                price: Price::from_minor_units(price_minor_units, CurrencyCode::INR),
                is_published: true,
            })
            .await
            .expect("create course")
    }

    /// Create a module under a course.
    pub async fn seed_module(&self, course: &Course, title: &str, is_free: bool) -> Module {
        self.store
            .create_module(
                course.id,
                NewModule {
                    title: title.to_owned(),
                    is_free,
                    position: 0,
                },
            )
            .await
            .expect("create module")
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// GET `path` anonymously.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request("GET", path, None, None).await
    }

    /// GET `path` with a bearer token.
    pub async fn get_auth(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.request("GET", path, Some(token), None).await
    }

    /// POST `path` with a bearer token and optional JSON body.
    pub async fn post_auth(
        &self,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request("POST", path, Some(token), body).await
    }

    /// PATCH `path` with a bearer token and a JSON body.
    pub async fn patch_auth(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", path, Some(token), Some(body)).await
    }

    /// PUT `path` with a bearer token and a JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", path, Some(token), Some(body)).await
    }

    /// DELETE `path` with a bearer token.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.request("DELETE", path, Some(token), None).await
    }

    /// POST a correctly signed settlement webhook.
    pub async fn post_payment_webhook(&self, payload: &Value) -> (StatusCode, Value) {
        let body = serde_json::to_vec(payload).expect("encode payload");
        let signature = webhook::sign(&self.config.gateway.webhook_secret, &body);
        self.post_webhook("/webhooks/payments", "x-gateway-signature", &signature, body)
            .await
    }

    /// POST a correctly signed auth lifecycle webhook.
    pub async fn post_auth_webhook(&self, payload: &Value) -> (StatusCode, Value) {
        let body = serde_json::to_vec(payload).expect("encode payload");
        let signature = webhook::sign(&self.config.auth.webhook_secret, &body);
        self.post_webhook("/webhooks/auth", "x-auth-signature", &signature, body)
            .await
    }

    /// POST a webhook body with an explicit signature header value.
    pub async fn post_webhook(
        &self,
        path: &str,
        header_name: &str,
        signature: &str,
        body: Vec<u8>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header_name, signature)
            .body(Body::from(body))
            .expect("build request");
        self.send(request).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("encode body"))),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
