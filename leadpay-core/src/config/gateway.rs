//! Payment gateway credentials.

use url::Url;

/// Credentials and endpoint of the gateway's Orders API.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API root, e.g. `https://api.razorpay.com`.
    pub api_base: Url,
    /// Public key id, also embedded in checkout links.
    pub key_id: String,
    /// Key secret for basic auth.
    pub key_secret: String,
}
