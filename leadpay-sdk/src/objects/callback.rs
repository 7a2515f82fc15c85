//! Gateway callback parameters and the redirect markers they resolve to.

use serde::{Deserialize, Serialize};
use url::Url;

/// Parameters of the success callback.
///
/// The gateway sends them as a query string on a browser redirect (GET) or
/// as a form/JSON body (POST). Every field is optional on the wire; a
/// missing field is a malformed callback, not a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyCallbackParams {
    #[serde(rename = "razorpay_order_id", default)]
    pub order_id: Option<String>,
    #[serde(rename = "razorpay_payment_id", default)]
    pub payment_id: Option<String>,
    #[serde(rename = "razorpay_signature", default)]
    pub signature: Option<String>,
}

impl VerifyCallbackParams {
    /// Returns `(order_id, payment_id, signature)` when all three are present
    /// and non-empty.
    pub fn complete(&self) -> Option<(&str, &str, &str)> {
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.is_empty())
        }
        Some((
            present(&self.order_id)?,
            present(&self.payment_id)?,
            present(&self.signature)?,
        ))
    }
}

/// Parameters of the failure/cancel callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedCallbackParams {
    #[serde(rename = "orderId", default)]
    pub order_id: Option<String>,
}

/// Marker appended to the cancel destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    MissingParams,
    MissingOrderId,
    InvalidOrder,
    SignatureFailed,
    /// Authentic callback for a payment that already failed or was cancelled.
    PaymentClosed,
    ServerError,
    UserCancelled,
}

impl CancelReason {
    /// The query pair carried by the redirect, e.g. `error=signature_failed`.
    pub fn query_pair(&self) -> (&'static str, &'static str) {
        match self {
            CancelReason::MissingParams => ("error", "missing_params"),
            CancelReason::MissingOrderId => ("error", "missing_order_id"),
            CancelReason::InvalidOrder => ("error", "invalid_order"),
            CancelReason::SignatureFailed => ("error", "signature_failed"),
            CancelReason::PaymentClosed => ("error", "payment_closed"),
            CancelReason::ServerError => ("error", "server_error"),
            CancelReason::UserCancelled => ("reason", "user_cancelled"),
        }
    }

    /// Build the cancel destination for this reason.
    pub fn destination(&self, cancel_url: &Url) -> Url {
        let (key, value) = self.query_pair();
        with_query(cancel_url, key, value)
    }
}

/// Build the success destination carrying the gateway payment id.
pub fn success_destination(success_url: &Url, payment_id: &str) -> Url {
    with_query(success_url, "payment_id", payment_id)
}

fn with_query(base: &Url, key: &str, value: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair(key, value);
    url
}
