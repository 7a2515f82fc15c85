pub mod callback;
pub mod gateway;
pub mod lead;
pub mod user;

pub use callback::{CancelReason, FailedCallbackParams, VerifyCallbackParams};
pub use gateway::{CreateGatewayOrder, GatewayOrder, OrderNotes};
pub use lead::{Experience, FieldError, LeadForm, LeadSubmission};
pub use user::{PaymentResponse, PaymentStatus, UserPaymentStatus, UserResponse};

use serde::{Deserialize, Serialize};

/// Successful JSON envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Error JSON envelope shared by every direct API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiFailure {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ApiFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}
