//! Checkout configuration.

use url::Url;

/// What is charged and where the payer is sent afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Fixed amount in the currency's minor unit (e.g. paise).
    pub amount: i64,
    /// ISO currency code sent to the gateway.
    pub currency: String,
    /// Merchant name shown on the hosted checkout page.
    pub merchant_name: String,
    /// Externally reachable base URL of this server, used for callbacks.
    pub backend_url: Url,
    /// Frontend page for successful payments.
    pub success_url: Url,
    /// Frontend page for cancelled or failed payments.
    pub cancel_url: Url,
    /// Hosted checkout page of the gateway.
    pub checkout_page: Url,
}
