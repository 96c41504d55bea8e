//! Inbound webhook routes.
//!
//! Both collaborators sign the raw body with HMAC-SHA256; the signature is
//! verified before anything is decoded. Handlers are idempotent because
//! both providers deliver at least once.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::gateway::SettlementEvent;
use crate::identity::events::LifecycleEvent;
use crate::state::AppState;
use crate::webhook::verify_signature;

/// Header carrying the payment gateway's body signature.
pub const GATEWAY_SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Header carrying the auth provider's body signature.
pub const AUTH_SIGNATURE_HEADER: &str = "x-auth-signature";

/// POST /webhooks/payments
pub async fn payments(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    require_signature(
        &headers,
        GATEWAY_SIGNATURE_HEADER,
        &state.config().gateway.webhook_secret,
        &body,
    )?;

    let event: SettlementEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("malformed settlement payload: {e}")))?;

    state
        .ledger()
        .settle_purchase(
            &event.order_ref,
            event.event.outcome(),
            event.payment_ref.as_deref(),
        )
        .await?;

    Ok(Json(json!({ "received": true })))
}

/// POST /webhooks/auth
pub async fn auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    require_signature(
        &headers,
        AUTH_SIGNATURE_HEADER,
        &state.config().auth.webhook_secret,
        &body,
    )?;

    let event: LifecycleEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("malformed lifecycle payload: {e}")))?;

    state.accounts().apply_lifecycle_event(event).await?;

    Ok(Json(json!({ "received": true })))
}

fn require_signature(
    headers: &HeaderMap,
    header: &str,
    secret: &secrecy::SecretString,
    body: &[u8],
) -> Result<()> {
    let signature = headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_owned()))?;

    if !verify_signature(secret, body, signature) {
        return Err(AppError::Unauthorized("invalid webhook signature".to_owned()));
    }
    Ok(())
}
