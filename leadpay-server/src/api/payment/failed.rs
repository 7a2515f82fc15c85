use axum::{extract::State, response::Redirect};
use kanau::processor::Processor;
use leadpay_core::processors::CancelCallback;
use leadpay_sdk::objects::FailedCallbackParams;

use super::redirect;
use crate::api::extractors::CallbackParams;
use crate::state::AppState;

/// `GET|POST /failed?orderId=…`: the payer left the checkout or the
/// payment failed.
pub async fn failed(
    state: State<AppState>,
    CallbackParams(params): CallbackParams<FailedCallbackParams>,
) -> Redirect {
    let checkout = state.config.checkout().await;
    let order_id = params.order_id;

    let outcome = state
        .checkout()
        .process(CancelCallback {
            order_id: order_id.clone(),
        })
        .await;
    redirect(outcome, order_id.as_deref(), &checkout)
}
