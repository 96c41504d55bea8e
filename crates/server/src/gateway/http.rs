//! HTTP client for the hosted payment gateway's orders API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use chalkbox_core::Price;

use super::{GatewayError, PaymentGateway};
use crate::config::GatewayConfig;

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    id: String,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    #[serde(default)]
    description: String,
}

/// Client for the gateway's `/v1/orders` endpoint.
///
/// Authenticates with HTTP basic auth (key id / key secret). Failures are
/// surfaced to the caller as upstream errors; there is no automatic retry.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: SecretString,
}

impl HttpGateway {
    /// Create a client from gateway configuration.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    #[instrument(skip(self), fields(amount = amount.minor_units, receipt))]
    async fn create_order(&self, amount: Price, receipt: &str) -> Result<String, GatewayError> {
        let request = CreateOrderRequest {
            amount: amount.minor_units,
            currency: amount.currency.code(),
            receipt,
        };

        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<GatewayErrorBody>()
                .await
                .map(|body| body.description)
                .unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let order: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        debug!(order_ref = %order.id, "gateway order created");
        Ok(order.id)
    }
}
