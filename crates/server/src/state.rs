//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ChalkboxConfig;
use crate::db::Store;
use crate::gateway::PaymentGateway;
use crate::identity::IdentityProvider;
use crate::services::{AccountService, CatalogService, EntitlementService, LedgerService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Collaborators are held as trait objects so
/// the same router runs over `PostgreSQL` plus real upstreams in production
/// and over the in-memory backends in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ChalkboxConfig,
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    identity: Arc<dyn IdentityProvider>,
    catalog: CatalogService,
}

impl AppState {
    /// Create a new application state over the given backends.
    #[must_use]
    pub fn new(
        config: ChalkboxConfig,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let catalog = CatalogService::new(store.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                gateway,
                identity,
                catalog,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ChalkboxConfig {
        &self.inner.config
    }

    /// Get the storage backend.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    /// Get the identity provider.
    #[must_use]
    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.inner.identity
    }

    /// Get the cached catalog service. Shared so its cache survives across
    /// requests.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Build a ledger service over the shared backends.
    #[must_use]
    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(self.inner.store.clone(), self.inner.gateway.clone())
    }

    /// Build an entitlement service over the shared store.
    #[must_use]
    pub fn entitlements(&self) -> EntitlementService {
        EntitlementService::new(self.inner.store.clone())
    }

    /// Build an account-mirroring service over the shared store.
    #[must_use]
    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.inner.store.clone())
    }
}
