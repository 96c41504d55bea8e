//! Account domain types.
//!
//! Accounts mirror identities owned by the hosted auth provider. The
//! provider's opaque user id is stored as `external_id`; everything else
//! about sessions and credentials stays on the provider's side.

use chrono::{DateTime, Utc};
use serde::Serialize;

use chalkbox_core::{AccountId, AccountRole, Email};

/// A local account mirroring an auth-provider identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Internal account ID.
    pub id: AccountId,
    /// Stable identity string issued by the auth provider.
    pub external_id: String,
    /// Email address, kept in sync via `user.updated` webhooks.
    pub email: Email,
    /// Permission level. Defaults to `User`; only admin action changes it.
    pub role: AccountRole,
    /// When the account was first mirrored.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}
