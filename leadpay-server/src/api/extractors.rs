//! Custom Axum extractors.
//!
//! Provides:
//! - `LeadBody`: the lead form as JSON or urlencoded body, rejected with
//!   the shared JSON error.
//! - `CallbackParams<T>`: gateway callback fields from the query string
//!   and, for POST, the form or JSON body. Never rejects: anything that
//!   does not parse counts as absent.

use std::convert::Infallible;

use axum::{
    Form, Json,
    extract::{FromRequest, Query, Request},
    http::{Method, header::CONTENT_TYPE},
};
use leadpay_sdk::objects::{FailedCallbackParams, LeadForm, VerifyCallbackParams};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;

fn content_type(req: &Request) -> &str {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn is_form(content_type: &str) -> bool {
    content_type.starts_with("application/x-www-form-urlencoded")
}

fn is_json(content_type: &str) -> bool {
    content_type.starts_with("application/json")
}

// ---------------------------------------------------------------------------
// LeadBody
// ---------------------------------------------------------------------------

/// The submitted lead form, not yet validated.
pub struct LeadBody(pub LeadForm);

impl<S: Send + Sync> FromRequest<S> for LeadBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(content_type(&req)) {
            let Form(form) = Form::<LeadForm>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(LeadBody(form))
        } else {
            let Json(form) = Json::<LeadForm>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(LeadBody(form))
        }
    }
}

// ---------------------------------------------------------------------------
// CallbackParams
// ---------------------------------------------------------------------------

/// Callback fields that may arrive split between query and body.
pub trait CallbackFields: DeserializeOwned + Default + Send {
    /// Keep the fields present in `self`, take the rest from `fallback`.
    fn or(self, fallback: Self) -> Self;
}

impl CallbackFields for VerifyCallbackParams {
    fn or(self, fallback: Self) -> Self {
        Self {
            order_id: self.order_id.or(fallback.order_id),
            payment_id: self.payment_id.or(fallback.payment_id),
            signature: self.signature.or(fallback.signature),
        }
    }
}

impl CallbackFields for FailedCallbackParams {
    fn or(self, fallback: Self) -> Self {
        Self {
            order_id: self.order_id.or(fallback.order_id),
        }
    }
}

pub struct CallbackParams<T>(pub T);

impl<S, T> FromRequest<S> for CallbackParams<T>
where
    S: Send + Sync,
    T: CallbackFields,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = match Query::<T>::try_from_uri(req.uri()) {
            Ok(Query(query)) => query,
            Err(e) => {
                tracing::debug!(error = %e, "Unparseable callback query");
                T::default()
            }
        };
        if req.method() != Method::POST {
            return Ok(CallbackParams(query));
        }

        let content_type = content_type(&req).to_owned();
        let body = if is_form(&content_type) {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(body)| body)
                .map_err(|e| e.body_text())
        } else if is_json(&content_type) {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(body)| body)
                .map_err(|e| e.body_text())
        } else {
            Ok(T::default())
        };
        let body = body.unwrap_or_else(|reason| {
            tracing::debug!(%reason, "Unparseable callback body");
            T::default()
        });

        Ok(CallbackParams(body.or(query)))
    }
}
