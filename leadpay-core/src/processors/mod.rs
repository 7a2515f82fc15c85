//! Checkout processors.
//!
//! [`CheckoutProcessor`] carries the injected store and gateway and handles
//! three commands through [`kanau::processor::Processor`]:
//!
//! - `SubmitLead`: persists a pending user, creates the gateway order and
//!   the payment record, and returns the hosted checkout destination
//! - `VerifyCallback`: authenticates the gateway's success callback and
//!   finalizes both records
//! - `CancelCallback`: finalizes both records after an aborted checkout

pub mod cancel_callback;
pub mod submit_lead;
pub mod verify_callback;

pub use cancel_callback::CancelCallback;
pub use submit_lead::{CheckoutSession, SubmitLead, SubmitLeadError};
pub use verify_callback::VerifyCallback;

use std::sync::Arc;

use leadpay_sdk::objects::CancelReason;
use leadpay_sdk::objects::callback::success_destination;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::gateway::{GatewayError, PaymentGateway};
use crate::store::{LeadStore, StoreError};

/// Handles order creation and gateway callbacks.
///
/// Cheap to clone; both dependencies are behind `Arc`.
#[derive(Clone)]
pub struct CheckoutProcessor {
    pub store: Arc<dyn LeadStore>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl CheckoutProcessor {
    pub fn new(store: Arc<dyn LeadStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Recover the owning user of a gateway order from its notes.
    async fn order_owner(&self, order_id: &str) -> Result<Option<Uuid>, GatewayError> {
        let order = self.gateway.fetch_order(order_id).await?;
        Ok(order.and_then(|o| o.user_id()))
    }
}

/// Where a callback sends the payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResolution {
    /// Success destination carrying the gateway payment id.
    Paid { payment_id: String },
    /// Cancel destination carrying a marker.
    Cancelled(CancelReason),
}

impl CallbackResolution {
    pub fn destination(&self, checkout: &CheckoutConfig) -> Url {
        match self {
            CallbackResolution::Paid { payment_id } => {
                success_destination(&checkout.success_url, payment_id)
            }
            CallbackResolution::Cancelled(reason) => reason.destination(&checkout.cancel_url),
        }
    }
}

/// Errors that abort a callback. The HTTP layer turns them into a
/// `server_error` redirect.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
