//! HTTP API mounted under `/api`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use leadpay_core::config::{RateLimitConfig, ServerConfig};
use leadpay_sdk::objects::ApiFailure;
use leadpay_sdk::signature::GATEWAY_SIGNATURE_HEADER;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::state::AppState;

pub mod error;
pub mod extractors;
mod payment;
mod users;

/// Build the `/api` router.
///
/// Payment callbacks come from the gateway's pages: they accept any origin
/// and are never rate limited. Everything else is limited to the configured
/// frontend origins and to `rate_limit` requests per client IP.
pub fn router(config: &ServerConfig) -> anyhow::Result<Router<AppState>> {
    // Behind a proxy the client IP comes from `X-Forwarded-For` /
    // `X-Real-IP`, otherwise from the peer address.
    let limiter = GovernorConfigBuilder::default()
        .period(replenish_interval(&config.rate_limit)?)
        .burst_size(config.rate_limit.max_requests)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .context("invalid rate limit configuration")?;

    let frontend = Router::new()
        .nest("/users", users::router())
        .route("/health", get(health_check))
        .method_not_allowed_fallback(method_not_allowed)
        .layer(GovernorLayer::new(Arc::new(limiter)))
        .layer(middleware::map_response(too_many_requests))
        .layer(frontend_cors(&config.allowed_origins));

    Ok(Router::new()
        .merge(frontend)
        .nest("/payment", payment::router().layer(payment_cors())))
}

fn replenish_interval(limit: &RateLimitConfig) -> anyhow::Result<Duration> {
    limit
        .replenish_interval()
        .context("rate limit needs positive max_requests and window")
}

/// Replace the limiter's plain-text rejection with the JSON envelope,
/// keeping its `Retry-After` headers.
async fn too_many_requests(res: Response) -> Response {
    if res.status() != StatusCode::TOO_MANY_REQUESTS {
        return res;
    }
    let (mut parts, _) = res.into_parts();
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    (
        parts,
        Json(ApiFailure::new(
            "Too many requests from this IP, please try again later.",
        )),
    )
        .into_response()
}

fn frontend_cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn payment_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(GATEWAY_SIGNATURE_HEADER),
        ])
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    success: bool,
    message: &'static str,
    timestamp: String,
    version: &'static str,
}

/// Liveness probe, 200 whenever the process is up.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        message: "Server is running",
        timestamp: time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Known route, unsupported method.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiFailure::new("Method not allowed")),
    )
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiFailure::new("API route not found")),
    )
}
