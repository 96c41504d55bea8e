//! Mirroring of auth-provider lifecycle events into local accounts.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use chalkbox_core::{Email, EmailError};

use crate::db::{RepositoryError, Store};
use crate::identity::events::LifecycleEvent;

/// Errors from applying a lifecycle event.
#[derive(Debug, Error)]
pub enum AccountServiceError {
    /// The event carried an email that does not parse.
    #[error("invalid email in lifecycle event: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Applies account-lifecycle notifications to the local mirror.
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Apply one decoded lifecycle event.
    ///
    /// Deliveries are at least once and may arrive out of order, so every
    /// branch is written to converge: a replayed create updates the email,
    /// an update for an account never created falls back to an upsert, and
    /// a delete for an unknown account is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::InvalidEmail`] for unparseable email
    /// addresses; callers map this to a validation failure so the provider
    /// does not retry a payload that can never apply.
    #[instrument(skip(self, event))]
    pub async fn apply_lifecycle_event(
        &self,
        event: LifecycleEvent,
    ) -> Result<(), AccountServiceError> {
        match event {
            LifecycleEvent::Created(identity) => {
                let email = Email::parse(&identity.email)?;
                let account = self.store.upsert_account(&identity.id, &email).await?;
                info!(external_id = %identity.id, account_id = %account.id, "account mirrored");
            }
            LifecycleEvent::Updated(identity) => {
                let email = Email::parse(&identity.email)?;
                let updated = self
                    .store
                    .update_account_email(&identity.id, &email)
                    .await?;
                if updated.is_none() {
                    // The create event was lost or is still in flight.
                    warn!(external_id = %identity.id, "update for unknown account, upserting");
                    self.store.upsert_account(&identity.id, &email).await?;
                }
            }
            LifecycleEvent::Deleted(reference) => {
                let deleted = self.store.delete_account(&reference.id).await?;
                if deleted {
                    info!(external_id = %reference.id, "account deleted");
                } else {
                    warn!(external_id = %reference.id, "delete for unknown account ignored");
                }
            }
        }
        Ok(())
    }
}
