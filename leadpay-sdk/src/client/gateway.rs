//! Orders API client (this server → payment gateway).
//!
//! Requests authenticate with HTTP basic auth using the key id and key
//! secret issued by the gateway.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use super::ClientError;
use crate::objects::gateway::{CreateGatewayOrder, GatewayOrder};

/// Production API root of the gateway.
pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com";

/// Typed HTTP client for the gateway **Orders API**.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: Url,
    key_id: String,
    key_secret: String,
}

impl GatewayClient {
    /// Create a new `GatewayClient`.
    ///
    /// * `base_url` – API root (e.g. `https://api.razorpay.com`). A path
    ///   prefix, as used behind a proxy, is kept.
    /// * `key_id` / `key_secret` – API credentials.
    pub fn new(
        base_url: Url,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url,
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        })
    }

    /// Public key id, also embedded in checkout links.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// `POST /v1/orders` – create an order.
    pub async fn create_order(
        &self,
        payload: &CreateGatewayOrder,
    ) -> Result<GatewayOrder, ClientError> {
        let url = self.orders_url(None)?;

        let resp = self
            .http
            .post(url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(payload)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /v1/orders/{id}` – fetch an order.
    ///
    /// Returns `Ok(None)` when the gateway does not know the id; it answers
    /// unknown ids with `400 BAD_REQUEST_ERROR` rather than 404.
    pub async fn fetch_order(&self, order_id: &str) -> Result<Option<GatewayOrder>, ClientError> {
        let url = self.orders_url(Some(order_id))?;

        let resp = self
            .http
            .get(url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await?;

        if matches!(
            resp.status(),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND
        ) {
            return Ok(None);
        }
        parse_response(resp).await.map(Some)
    }
}

impl GatewayClient {
    /// `{base}/v1/orders[/{id}]`, appended to whatever path the base has.
    fn orders_url(&self, order_id: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty().extend(["v1", "orders"]);
            if let Some(id) = order_id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
