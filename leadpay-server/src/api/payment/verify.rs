use axum::{extract::State, response::Redirect};
use kanau::processor::Processor;
use leadpay_core::processors::VerifyCallback;
use leadpay_sdk::objects::VerifyCallbackParams;

use super::redirect;
use crate::api::extractors::CallbackParams;
use crate::state::AppState;

/// `GET|POST /verify`: success callback carrying
/// `razorpay_order_id`, `razorpay_payment_id` and `razorpay_signature`.
pub async fn verify(
    state: State<AppState>,
    CallbackParams(params): CallbackParams<VerifyCallbackParams>,
) -> Redirect {
    let checkout = state.config.checkout().await;
    let signing = state.config.signing().await;
    let order_id = params.order_id.clone();

    let outcome = state
        .checkout()
        .process(VerifyCallback { params, signing })
        .await;
    redirect(outcome, order_id.as_deref(), &checkout)
}
