//! Authentication extractors.
//!
//! Requests authenticate with a bearer token issued by the hosted auth
//! provider. The extractors resolve the token to the provider's identity
//! string and then to the local [`Account`] mirror; handlers declare the
//! level they need by the extractor they take.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::models::Account;
use crate::state::AppState;

/// Extractor that requires an authenticated account.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     CurrentAccount(account): CurrentAccount,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", account.email)
/// }
/// ```
pub struct CurrentAccount(pub Account);

impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_account(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
    }
}

/// Extractor that optionally resolves the current account.
///
/// Unlike [`CurrentAccount`], an anonymous request is not rejected; a token
/// that fails to resolve is treated as absent.
pub struct OptionalAccount(pub Option<Account>);

impl FromRequestParts<AppState> for OptionalAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_account(parts, state).await?))
    }
}

/// Extractor that requires an account with the admin role.
pub struct RequireAdmin(pub Account);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentAccount(account) = CurrentAccount::from_request_parts(parts, state).await?;
        if !account.role.is_admin() {
            return Err(AppError::Forbidden("admin access required".to_owned()));
        }
        Ok(Self(account))
    }
}

async fn resolve_account(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<Account>, AppError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };

    let Some(external_id) = state.identity().resolve(token).await? else {
        return Ok(None);
    };

    // A valid token for an identity we have not mirrored yet resolves to
    // anonymous; the lifecycle webhook will create the account.
    Ok(state.store().account_by_external_id(&external_id).await?)
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
