//! Configuration types for leadpay.
//!
//! These types represent the validated runtime configuration used by the
//! server and the processors. The actual config loading/parsing is handled
//! by the server crate.

mod checkout;
mod gateway;
mod server;
mod signing;

pub use checkout::CheckoutConfig;
pub use gateway::GatewayConfig;
pub use server::{RateLimitConfig, ServerConfig};
pub use signing::SigningConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Sections that can be swapped at runtime (SIGHUP), each behind its own lock.
///
/// Server and gateway settings are read once at startup and are not part of
/// this struct.
#[derive(Clone)]
pub struct SharedConfig {
    /// Amount, currency and redirect destinations.
    pub checkout: Arc<RwLock<CheckoutConfig>>,
    /// Secret used to verify gateway callbacks.
    pub signing: Arc<RwLock<SigningConfig>>,
}

impl SharedConfig {
    pub fn new(checkout: CheckoutConfig, signing: SigningConfig) -> Self {
        Self {
            checkout: Arc::new(RwLock::new(checkout)),
            signing: Arc::new(RwLock::new(signing)),
        }
    }

    /// Snapshot of the checkout section.
    pub async fn checkout(&self) -> CheckoutConfig {
        self.checkout.read().await.clone()
    }

    /// Snapshot of the signing section.
    pub async fn signing(&self) -> SigningConfig {
        self.signing.read().await.clone()
    }

    /// Replace both reloadable sections.
    pub async fn update(&self, checkout: CheckoutConfig, signing: SigningConfig) {
        *self.checkout.write().await = checkout;
        *self.signing.write().await = signing;
    }
}
