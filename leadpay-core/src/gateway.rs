//! Payment gateway seam.
//!
//! Processors never hold a global client; they receive an
//! `Arc<dyn PaymentGateway>` so tests can substitute
//! [`MemoryGateway`](crate::testing::MemoryGateway).

use async_trait::async_trait;
use leadpay_sdk::client::{ClientError, GatewayClient};
use leadpay_sdk::objects::{CreateGatewayOrder, GatewayOrder};
use thiserror::Error;

/// Errors that can occur while talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Client(#[from] ClientError),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id embedded in checkout links.
    fn key_id(&self) -> &str;

    /// Create an order. Fails if the gateway rejects or cannot be reached.
    async fn create_order(&self, request: CreateGatewayOrder)
    -> Result<GatewayOrder, GatewayError>;

    /// Fetch an order. `Ok(None)` if the gateway does not know it.
    async fn fetch_order(&self, order_id: &str) -> Result<Option<GatewayOrder>, GatewayError>;
}

#[async_trait]
impl PaymentGateway for GatewayClient {
    fn key_id(&self) -> &str {
        GatewayClient::key_id(self)
    }

    async fn create_order(
        &self,
        request: CreateGatewayOrder,
    ) -> Result<GatewayOrder, GatewayError> {
        Ok(GatewayClient::create_order(self, &request).await?)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Option<GatewayOrder>, GatewayError> {
        Ok(GatewayClient::fetch_order(self, order_id).await?)
    }
}
