//! Account-lifecycle webhook payloads.
//!
//! The provider delivers `user.created`, `user.updated`, and `user.deleted`
//! notifications at least once each. Payloads are decoded into a tagged
//! enum after signature verification; unknown kinds and malformed bodies
//! are validation errors, never silently-accepted partial objects.

use serde::Deserialize;

/// Identity fields carried by create/update events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleIdentity {
    /// The provider's stable identity string.
    pub id: String,
    /// Current primary email address.
    pub email: String,
}

/// Reference carried by delete events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleReference {
    pub id: String,
}

/// A decoded account-lifecycle notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LifecycleEvent {
    #[serde(rename = "user.created")]
    Created(LifecycleIdentity),
    #[serde(rename = "user.updated")]
    Updated(LifecycleIdentity),
    #[serde(rename = "user.deleted")]
    Deleted(LifecycleReference),
}
