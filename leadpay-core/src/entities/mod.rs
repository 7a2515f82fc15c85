pub mod payment;
pub mod user;

use leadpay_sdk::objects::{
    Experience as SdkExperience, PaymentStatus as SdkPaymentStatus,
    UserPaymentStatus as SdkUserPaymentStatus,
};

/// Experience level for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `leadpay_sdk::objects::Experience`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "experience_level")]
pub enum ExperienceLevel {
    None,
    Beginner,
    Intermediate,
    Advanced,
}

impl From<ExperienceLevel> for SdkExperience {
    fn from(value: ExperienceLevel) -> Self {
        match value {
            ExperienceLevel::None => SdkExperience::None,
            ExperienceLevel::Beginner => SdkExperience::Beginner,
            ExperienceLevel::Intermediate => SdkExperience::Intermediate,
            ExperienceLevel::Advanced => SdkExperience::Advanced,
        }
    }
}

impl From<SdkExperience> for ExperienceLevel {
    fn from(value: SdkExperience) -> Self {
        match value {
            SdkExperience::None => ExperienceLevel::None,
            SdkExperience::Beginner => ExperienceLevel::Beginner,
            SdkExperience::Intermediate => ExperienceLevel::Intermediate,
            SdkExperience::Advanced => ExperienceLevel::Advanced,
        }
    }
}

/// Payment status of a user for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "user_payment_status")]
pub enum UserPaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl From<UserPaymentStatus> for SdkUserPaymentStatus {
    fn from(value: UserPaymentStatus) -> Self {
        match value {
            UserPaymentStatus::Pending => SdkUserPaymentStatus::Pending,
            UserPaymentStatus::Completed => SdkUserPaymentStatus::Completed,
            UserPaymentStatus::Failed => SdkUserPaymentStatus::Failed,
        }
    }
}

/// Status of a payment attempt for database operations.
///
/// Transitions are one-way: `Created` moves to exactly one of the terminal
/// statuses and never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "payment_status")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Created)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        SdkPaymentStatus::from(*self).fmt(f)
    }
}

impl From<PaymentStatus> for SdkPaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Created => SdkPaymentStatus::Created,
            PaymentStatus::Paid => SdkPaymentStatus::Paid,
            PaymentStatus::Failed => SdkPaymentStatus::Failed,
            PaymentStatus::Cancelled => SdkPaymentStatus::Cancelled,
        }
    }
}

/// Current UTC time in the column representation (`TIMESTAMP`).
pub fn now_utc() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}
