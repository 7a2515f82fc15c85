//! Unit-of-work seam over the user and payment records.
//!
//! Every operation that touches both records runs inside one
//! [`LeadTransaction`]. The handle is owned: `commit` consumes it, `rollback`
//! consumes it, and dropping it uncommitted discards its writes.

use async_trait::async_trait;
use kanau::processor::Processor;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::payment::{Payment, PaymentFinalization, PaymentInsert};
use crate::entities::user::{GetUserWithPayment, User, UserInsert, UserWithPayment};
use crate::entities::UserPaymentStatus;
use crate::framework::{DatabaseProcessor, TransactionProcessor};

/// Errors produced by a [`LeadStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// A unique constraint on email or mobile rejected the write.
    #[error("a user with this email or mobile number already exists")]
    Duplicate,
}

/// Unique constraints guarding a user's contact details.
pub const USER_CONTACT_CONSTRAINTS: [&str; 2] = ["users_email_key", "users_mobile_key"];

fn is_contact_conflict(constraint: Option<&str>) -> bool {
    constraint.is_some_and(|c| USER_CONTACT_CONSTRAINTS.contains(&c))
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let duplicate_contact = err
            .as_database_error()
            .is_some_and(|e| e.is_unique_violation() && is_contact_conflict(e.constraint()));
        if duplicate_contact {
            StoreError::Duplicate
        } else {
            StoreError::Database(err)
        }
    }
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> Result<Box<dyn LeadTransaction>, StoreError>;

    /// Read a user and its linked payment outside of any transaction.
    async fn user_with_payment(&self, user_id: Uuid)
    -> Result<Option<UserWithPayment>, StoreError>;
}

#[async_trait]
pub trait LeadTransaction: Send {
    async fn find_user_by_contact(
        &mut self,
        email: &str,
        mobile: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn insert_user(&mut self, insert: UserInsert) -> Result<User, StoreError>;

    async fn insert_payment(&mut self, insert: PaymentInsert) -> Result<Payment, StoreError>;

    async fn link_payment(&mut self, user_id: Uuid, payment_id: Uuid) -> Result<(), StoreError>;

    /// Fetch the payment for a gateway order, locked until the transaction
    /// ends.
    async fn lock_payment_by_order(
        &mut self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, StoreError>;

    /// Apply a terminal status to a `created` payment. Returns `false` (and
    /// changes nothing) if the payment is already terminal.
    async fn finalize_payment(&mut self, update: PaymentFinalization)
    -> Result<bool, StoreError>;

    async fn set_user_payment_status(
        &mut self,
        user_id: Uuid,
        status: UserPaymentStatus,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Roll back and log, for error paths that already carry an error.
pub async fn abort(tx: Box<dyn LeadTransaction>) {
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, "Failed to roll back transaction");
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl LeadStore for DatabaseProcessor {
    async fn begin(&self) -> Result<Box<dyn LeadTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(TransactionProcessor { tx }))
    }

    async fn user_with_payment(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserWithPayment>, StoreError> {
        Ok(self.process(GetUserWithPayment { user_id }).await?)
    }
}

#[async_trait]
impl LeadTransaction for TransactionProcessor<'static> {
    async fn find_user_by_contact(
        &mut self,
        email: &str,
        mobile: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_contact(self, email, mobile).await?)
    }

    async fn insert_user(&mut self, insert: UserInsert) -> Result<User, StoreError> {
        Ok(User::insert(self, insert).await?)
    }

    async fn insert_payment(&mut self, insert: PaymentInsert) -> Result<Payment, StoreError> {
        Ok(Payment::insert(self, insert).await?)
    }

    async fn link_payment(&mut self, user_id: Uuid, payment_id: Uuid) -> Result<(), StoreError> {
        Ok(User::link_payment(self, user_id, payment_id).await?)
    }

    async fn lock_payment_by_order(
        &mut self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, StoreError> {
        Ok(Payment::lock_by_order(self, gateway_order_id).await?)
    }

    async fn finalize_payment(
        &mut self,
        update: PaymentFinalization,
    ) -> Result<bool, StoreError> {
        Ok(Payment::finalize(self, update).await?)
    }

    async fn set_user_payment_status(
        &mut self,
        user_id: Uuid,
        status: UserPaymentStatus,
    ) -> Result<(), StoreError> {
        Ok(User::set_payment_status(self, user_id, status).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(self.tx.rollback().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_contact_constraints_are_duplicates() {
        assert!(is_contact_conflict(Some("users_email_key")));
        assert!(is_contact_conflict(Some("users_mobile_key")));
        assert!(!is_contact_conflict(Some("payments_gateway_order_id_key")));
        assert!(!is_contact_conflict(None));
    }

    #[test]
    fn test_other_errors_stay_database_errors() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
