//! Users API handlers.
//!
//! # Endpoints
//!
//! - `POST /submit` – validate the lead form, create the order and redirect
//!   to the hosted checkout
//! - `GET  /{id}`   – a user and its payment

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod get_user;
mod submit;

/// Build the Users API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit::submit))
        .route("/{id}", get(get_user::get_user))
        .method_not_allowed_fallback(super::method_not_allowed)
}
