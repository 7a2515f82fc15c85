//! TOML file configuration structures.
//!
//! These structs directly map to the `leadpay-config.toml` file format.
//! Every section is optional; command-line flags and environment variables
//! are layered on top by [`ConfigLoader`](super::ConfigLoader).

use serde::{Deserialize, Serialize};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub checkout: CheckoutConfig,
    pub signing: SigningConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on; the server binds all interfaces.
    pub port: u16,
    /// Frontend origins allowed by CORS on the non-payment routes.
    pub allowed_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            allowed_origins: vec!["http://localhost:5173".to_owned()],
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-IP request limit on the non-payment API routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

/// Payment gateway credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_base: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            api_base: leadpay_sdk::client::DEFAULT_API_BASE.to_owned(),
        }
    }
}

/// What is charged and where the payer goes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub merchant_name: String,
    pub backend_url: String,
    pub success_url: String,
    pub cancel_url: String,
    pub checkout_page: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            amount: 50000,
            currency: "INR".to_owned(),
            merchant_name: "Manga Course".to_owned(),
            backend_url: "http://localhost:5000".to_owned(),
            success_url: "http://localhost:5173/success".to_owned(),
            cancel_url: "http://localhost:5173".to_owned(),
            checkout_page: leadpay_sdk::checkout::DEFAULT_CHECKOUT_URL.to_owned(),
        }
    }
}

/// Callback signature secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Falls back to the gateway key secret when unset.
    pub secret: Option<String>,
}
