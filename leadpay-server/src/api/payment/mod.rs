//! Payment callback handlers.
//!
//! These endpoints are hit by the gateway's browser redirect or by a direct
//! POST. Every outcome, including internal failures, is a redirect to the
//! frontend; they never answer with a JSON error.
//!
//! # Endpoints
//!
//! - `GET|POST /verify` – authenticate the success callback
//! - `GET|POST /failed` – record an aborted checkout

use axum::{Router, response::Redirect, routing::get};
use leadpay_core::config::CheckoutConfig;
use leadpay_core::processors::{CallbackError, CallbackResolution};
use leadpay_sdk::objects::CancelReason;

use crate::state::AppState;

mod failed;
mod verify;

/// Build the payment callback router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify", get(verify::verify).post(verify::verify))
        .route("/failed", get(failed::failed).post(failed::failed))
}

/// Redirect for a processor outcome; errors go to the cancel destination.
fn redirect(
    outcome: Result<CallbackResolution, CallbackError>,
    order_id: Option<&str>,
    checkout: &CheckoutConfig,
) -> Redirect {
    let resolution = outcome.unwrap_or_else(|e| {
        tracing::error!(order_id, error = %e, "Payment callback failed");
        CallbackResolution::Cancelled(CancelReason::ServerError)
    });
    Redirect::to(resolution.destination(checkout).as_str())
}
