//! Application state shared across all request handlers.

use leadpay_core::config::SharedConfig;
use leadpay_core::gateway::PaymentGateway;
use leadpay_core::processors::CheckoutProcessor;
use leadpay_core::store::LeadStore;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// User and payment records.
    pub store: Arc<dyn LeadStore>,
    /// Orders API of the payment gateway.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Reloadable configuration sections.
    pub config: SharedConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LeadStore>,
        gateway: Arc<dyn PaymentGateway>,
        config: SharedConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    /// Processor for order creation and callbacks.
    pub fn checkout(&self) -> CheckoutProcessor {
        CheckoutProcessor::new(self.store.clone(), self.gateway.clone())
    }
}
