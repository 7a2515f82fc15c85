use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use kanau::processor::Processor;
use leadpay_core::processors::SubmitLead;

use crate::api::error::ApiError;
use crate::api::extractors::LeadBody;
use crate::state::AppState;

/// `POST /submit`: create a pending user and its order, then send the
/// payer to the hosted checkout with `303 See Other`.
pub async fn submit(
    state: State<AppState>,
    LeadBody(form): LeadBody,
) -> Result<Response, ApiError> {
    let submission = form.into_submission().map_err(ApiError::Validation)?;
    let checkout = state.config.checkout().await;

    let session = state
        .checkout()
        .process(SubmitLead {
            submission,
            checkout,
        })
        .await?;

    let location = HeaderValue::from_str(session.checkout_url.as_str())
        .map_err(|e| ApiError::Internal(format!("checkout url is not a header value: {e}")))?;
    Ok((StatusCode::SEE_OTHER, [(LOCATION, location)]).into_response())
}
