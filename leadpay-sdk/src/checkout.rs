//! Hosted checkout destination.
//!
//! After an order is created the payer is sent to the gateway's hosted
//! checkout page. The link carries the order, the prefilled contact fields
//! and the two callback destinations on this server:
//!
//! ```text
//! {backend}/api/payment/verify
//! {backend}/api/payment/failed?orderId={order_id}
//! ```

use url::Url;

/// Hosted checkout page of the gateway.
pub const DEFAULT_CHECKOUT_URL: &str = "https://api.razorpay.com/v1/checkout/embedded";

/// Path of the success/verify callback, relative to the backend base URL.
pub const VERIFY_CALLBACK_PATH: &str = "/api/payment/verify";

/// Path of the failure callback, relative to the backend base URL.
pub const FAILED_CALLBACK_PATH: &str = "/api/payment/failed";

/// Callback destinations for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    pub verify: Url,
    pub cancel: Url,
}

impl CallbackUrls {
    /// Build the callback destinations under `backend`.
    ///
    /// Paths are appended to whatever path `backend` already has, so a
    /// backend mounted under a prefix keeps it.
    pub fn new(backend: &Url, order_id: &str) -> Result<Self, url::ParseError> {
        let base = backend.as_str().trim_end_matches('/');
        let verify = Url::parse(&format!("{base}{VERIFY_CALLBACK_PATH}"))?;
        let mut cancel = Url::parse(&format!("{base}{FAILED_CALLBACK_PATH}"))?;
        cancel.query_pairs_mut().append_pair("orderId", order_id);
        Ok(Self { verify, cancel })
    }
}

/// Parameters of a hosted checkout link.
#[derive(Debug, Clone)]
pub struct CheckoutLink<'a> {
    pub key_id: &'a str,
    pub order_id: &'a str,
    /// Merchant name shown on the checkout page.
    pub merchant_name: &'a str,
    pub prefill_name: &'a str,
    pub prefill_email: &'a str,
    pub prefill_contact: &'a str,
    pub callbacks: &'a CallbackUrls,
}

impl CheckoutLink<'_> {
    /// Render the link against the gateway checkout page.
    pub fn to_url(&self, checkout_page: &Url) -> Url {
        let mut url = checkout_page.clone();
        url.query_pairs_mut()
            .append_pair("key_id", self.key_id)
            .append_pair("order_id", self.order_id)
            .append_pair("name", self.merchant_name)
            .append_pair("prefill[name]", self.prefill_name)
            .append_pair("prefill[email]", self.prefill_email)
            .append_pair("prefill[contact]", self.prefill_contact)
            .append_pair("callback_url", self.callbacks.verify.as_str())
            .append_pair("cancel_url", self.callbacks.cancel.as_str());
        url
    }
}
