//! Leadpay Server
//!
//! Captures course leads, creates a gateway order for each one and
//! finalizes the payment from the gateway's callbacks.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, Overrides, get_database_url};
use leadpay_core::config::SharedConfig;
use leadpay_core::framework::DatabaseProcessor;
use leadpay_sdk::client::GatewayClient;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Leadpay - lead capture with hosted payment checkout
#[derive(Parser, Debug)]
#[command(name = "leadpay-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (optional)
    #[arg(short, long, default_value = "./leadpay-config.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Gateway key id
    #[arg(long, env = "RAZORPAY_KEY_ID")]
    key_id: Option<String>,

    /// Gateway key secret
    #[arg(long, env = "RAZORPAY_KEY_SECRET", hide_env_values = true)]
    key_secret: Option<String>,

    /// Gateway API root
    #[arg(long, env = "RAZORPAY_API_BASE")]
    api_base: Option<String>,

    /// Callback signature secret (defaults to the key secret)
    #[arg(long, env = "PAYMENT_SIGNATURE_SECRET", hide_env_values = true)]
    signature_secret: Option<String>,

    /// Amount charged, in the currency's minor unit
    #[arg(long, env = "PAYMENT_AMOUNT")]
    amount: Option<i64>,

    /// Currency code sent to the gateway
    #[arg(long, env = "PAYMENT_CURRENCY")]
    currency: Option<String>,

    /// Merchant name shown on the checkout page
    #[arg(long, env = "CHECKOUT_NAME")]
    checkout_name: Option<String>,

    /// Comma separated CORS origins
    #[arg(long, env = "FRONTEND_URLS", value_delimiter = ',')]
    frontend_urls: Option<Vec<String>>,

    /// Frontend page for successful payments
    #[arg(long, env = "FRONTEND_SUCCESS_URL")]
    success_url: Option<String>,

    /// Frontend page for cancelled or failed payments
    #[arg(long, env = "FRONTEND_CANCEL_URL")]
    cancel_url: Option<String>,

    /// Externally reachable base URL of this server
    #[arg(long, env = "BACKEND_URL")]
    backend_url: Option<String>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            allowed_origins: self.frontend_urls.clone(),
            key_id: self.key_id.clone(),
            key_secret: self.key_secret.clone(),
            api_base: self.api_base.clone(),
            signing_secret: self.signature_secret.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            merchant_name: self.checkout_name.clone(),
            backend_url: self.backend_url.clone(),
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting leadpay-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.overrides()));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let server_config = loaded_config.server.clone();
    let listen_addr = server_config.listen;
    tracing::info!(
        amount = loaded_config.checkout.amount,
        currency = %loaded_config.checkout.currency,
        backend = %loaded_config.checkout.backend_url,
        rate_limit = server_config.rate_limit.max_requests,
        "Configuration loaded"
    );

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let gateway = GatewayClient::new(
        loaded_config.gateway.api_base,
        loaded_config.gateway.key_id,
        loaded_config.gateway.key_secret,
    )?;
    let store = DatabaseProcessor {
        pool: db_pool.clone(),
    };
    let shared_config = SharedConfig::new(loaded_config.checkout, loaded_config.signing);

    // Create application state
    let state = AppState::new(Arc::new(store), Arc::new(gateway), shared_config);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader)?;

    // Build the router
    let router = build_router(state, &server_config)?;

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests;
