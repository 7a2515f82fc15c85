//! Callback signing configuration.

/// Secret shared with the gateway for callback signatures.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    secret: Box<[u8]>,
}

impl SigningConfig {
    pub fn new(secret: impl Into<Box<[u8]>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Get the secret key bytes for HMAC verification.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}
