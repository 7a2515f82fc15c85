//! Configuration module for leadpay-server.
//!
//! Handles loading configuration from an optional TOML file, then applies
//! command-line / environment overrides and validates the result.

pub mod file;

use crate::config::file::FileConfig;
use leadpay_core::config::{
    CheckoutConfig, GatewayConfig, RateLimitConfig, ServerConfig, SigningConfig,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Values that take precedence over the file, usually from flags or
/// environment variables.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub allowed_origins: Option<Vec<String>>,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub api_base: Option<String>,
    pub signing_secret: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub merchant_name: Option<String>,
    pub backend_url: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub checkout: CheckoutConfig,
    pub signing: SigningConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    overrides: Overrides,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            overrides,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, if it exists
    /// 2. Apply overrides
    /// 3. Validate and build the runtime configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.config_path.display(),
                    "No config file, using defaults and environment"
                );
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        self.apply_overrides(&mut file_config);
        build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn apply_overrides(&self, config: &mut FileConfig) {
        let o = self.overrides.clone();
        if let Some(port) = o.port {
            config.server.port = port;
        }
        if let Some(origins) = o.allowed_origins {
            config.server.allowed_origins = origins;
        }
        if let Some(v) = o.key_id {
            config.gateway.key_id = v;
        }
        if let Some(v) = o.key_secret {
            config.gateway.key_secret = v;
        }
        if let Some(v) = o.api_base {
            config.gateway.api_base = v;
        }
        if let Some(v) = o.signing_secret {
            config.signing.secret = Some(v);
        }
        if let Some(v) = o.amount {
            config.checkout.amount = v;
        }
        if let Some(v) = o.currency {
            config.checkout.currency = v;
        }
        if let Some(v) = o.merchant_name {
            config.checkout.merchant_name = v;
        }
        if let Some(v) = o.backend_url {
            config.checkout.backend_url = v;
        }
        if let Some(v) = o.success_url {
            config.checkout.success_url = v;
        }
        if let Some(v) = o.cancel_url {
            config.checkout.cancel_url = v;
        }
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{field} is not a valid URL: {e}")))
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

fn build_loaded_config(file: FileConfig) -> Result<LoadedConfig, ConfigError> {
    require("gateway.key_id", &file.gateway.key_id)?;
    require("gateway.key_secret", &file.gateway.key_secret)?;
    require("checkout.currency", &file.checkout.currency)?;
    if file.checkout.amount <= 0 {
        return Err(ConfigError::ValidationError(
            "checkout.amount must be positive".to_owned(),
        ));
    }

    let rate_limit = RateLimitConfig {
        max_requests: file.server.rate_limit.max_requests,
        window: Duration::from_secs(file.server.rate_limit.window_secs),
    };
    if rate_limit.replenish_interval().is_none() {
        return Err(ConfigError::ValidationError(
            "server.rate_limit needs positive max_requests and window_secs".to_owned(),
        ));
    }

    let signing_secret = file
        .signing
        .secret
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| file.gateway.key_secret.clone());

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, file.server.port)),
            allowed_origins: file.server.allowed_origins,
            rate_limit,
        },
        gateway: GatewayConfig {
            api_base: parse_url("gateway.api_base", &file.gateway.api_base)?,
            key_id: file.gateway.key_id,
            key_secret: file.gateway.key_secret,
        },
        checkout: CheckoutConfig {
            amount: file.checkout.amount,
            currency: file.checkout.currency,
            merchant_name: file.checkout.merchant_name,
            backend_url: parse_url("checkout.backend_url", &file.checkout.backend_url)?,
            success_url: parse_url("checkout.success_url", &file.checkout.success_url)?,
            cancel_url: parse_url("checkout.cancel_url", &file.checkout.cancel_url)?,
            checkout_page: parse_url("checkout.checkout_page", &file.checkout.checkout_page)?,
        },
        signing: SigningConfig::new(signing_secret.into_bytes()),
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
