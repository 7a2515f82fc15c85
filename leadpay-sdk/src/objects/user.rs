//! User and payment records as exposed by `GET /api/users/{id}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lead::Experience;

/// Payment status of a user, for API responses.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `leadpay-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Status of a payment attempt, for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
    Cancelled,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Created => write!(f, "created"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: String,
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub status: PaymentStatus,
    pub payment_id: Option<String>,
    /// Unix timestamp of when the payment record was created.
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub city: String,
    pub experience: Experience,
    pub payment_status: UserPaymentStatus,
    pub payment: Option<PaymentResponse>,
    /// Unix timestamp of when the user was created.
    pub created_at: i64,
    pub updated_at: i64,
}
