//! Payment gateway integration.
//!
//! The gateway is an external collaborator: we ask it for an order
//! reference when a purchase begins, and it later delivers a signed
//! settlement notification keyed by that reference. Only order creation is
//! wrapped here; the gateway's own order lifecycle stays opaque.

mod http;

pub use http::HttpGateway;

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use chalkbox_core::{Price, SettlementOutcome};

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure talking to the gateway.
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the order request.
    #[error("gateway rejected order: {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
    },

    /// The gateway answered with a body we could not decode.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Backend trait for creating gateway orders.
///
/// Implementations must be thread-safe (`Send + Sync`); they are called
/// concurrently from request handlers.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order for `amount` and return the gateway's order
    /// reference. `receipt` is our idempotency-friendly local reference.
    async fn create_order(&self, amount: Price, receipt: &str) -> Result<String, GatewayError>;
}

/// A settlement notification, decoded after signature verification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementEvent {
    /// Which way the payment went.
    pub event: SettlementEventKind,
    /// The order reference the gateway issued at creation time.
    pub order_ref: String,
    /// The gateway's payment reference, present on captures.
    #[serde(default)]
    pub payment_ref: Option<String>,
}

/// Settlement notification kinds the gateway delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SettlementEventKind {
    #[serde(rename = "payment.captured")]
    Captured,
    #[serde(rename = "payment.failed")]
    Failed,
}

impl SettlementEventKind {
    /// The ledger outcome this notification maps to.
    #[must_use]
    pub const fn outcome(self) -> SettlementOutcome {
        match self {
            Self::Captured => SettlementOutcome::Captured,
            Self::Failed => SettlementOutcome::Failed,
        }
    }
}

/// Offline gateway that issues locally generated order references.
///
/// Used by tests and demo deployments without gateway credentials, the way
/// a fixed in-memory backend stands in for the real database.
#[derive(Default)]
pub struct StaticGateway {
    orders: Mutex<Vec<String>>,
}

impl StaticGateway {
    /// Create an offline gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Order references handed out so far, in order.
    #[must_use]
    pub fn issued(&self) -> Vec<String> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn create_order(&self, _amount: Price, receipt: &str) -> Result<String, GatewayError> {
        let order_ref = format!("order_local_{receipt}");
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(order_ref.clone());
        Ok(order_ref)
    }
}
