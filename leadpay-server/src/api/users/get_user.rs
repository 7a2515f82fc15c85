use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use leadpay_core::entities::payment::Payment;
use leadpay_core::entities::user::UserWithPayment;
use leadpay_sdk::objects::{ApiSuccess, PaymentResponse, UserResponse};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::state::AppState;

fn unix(ts: time::PrimitiveDateTime) -> i64 {
    ts.assume_utc().unix_timestamp()
}

fn payment_response(payment: Payment) -> PaymentResponse {
    PaymentResponse {
        id: payment.id,
        user_id: payment.user_id,
        order_id: payment.gateway_order_id,
        amount: payment.amount,
        currency: payment.currency,
        receipt: payment.receipt,
        status: payment.status.into(),
        payment_id: payment.gateway_payment_id,
        created_at: unix(payment.created_at),
        updated_at: unix(payment.updated_at),
    }
}

fn to_response(record: UserWithPayment) -> UserResponse {
    let UserWithPayment { user, payment } = record;
    UserResponse {
        id: user.id,
        name: user.name,
        mobile: user.mobile,
        email: user.email,
        city: user.city,
        experience: user.experience.into(),
        payment_status: user.payment_status.into(),
        payment: payment.map(payment_response),
        created_at: unix(user.created_at),
        updated_at: unix(user.updated_at),
    }
}

/// `GET /{id}`: a user and its linked payment.
///
/// An id that is not a UUID cannot name a user and is reported as not found.
pub async fn get_user(
    state: State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = ApiError::NotFound("User not found");
    let Ok(user_id) = Uuid::parse_str(&id) else {
        return Err(not_found);
    };

    let record = state
        .store
        .user_with_payment(user_id)
        .await?
        .ok_or(not_found)?;

    Ok(Json(ApiSuccess::new(to_response(record))))
}
