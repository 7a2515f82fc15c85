//! Failure/cancel callback.
//!
//! The payer always ends up on the cancel destination. Recording the
//! cancellation is best effort: if the order cannot be resolved the state is
//! left alone.

use kanau::processor::Processor;
use leadpay_sdk::objects::CancelReason;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CallbackError, CallbackResolution, CheckoutProcessor};
use crate::entities::payment::PaymentFinalization;
use crate::entities::{PaymentStatus, UserPaymentStatus};
use crate::store::{LeadTransaction, abort};

#[derive(Debug, Clone)]
pub struct CancelCallback {
    pub order_id: Option<String>,
}

const CANCELLED: CallbackResolution = CallbackResolution::Cancelled(CancelReason::UserCancelled);

impl Processor<CancelCallback> for CheckoutProcessor {
    type Output = CallbackResolution;
    type Error = CallbackError;

    #[tracing::instrument(skip_all, err, name = "CancelCallback")]
    async fn process(&self, cmd: CancelCallback) -> Result<CallbackResolution, CallbackError> {
        let Some(order_id) = cmd.order_id.as_deref().filter(|s| !s.is_empty()) else {
            warn!("Cancel callback without order id");
            return Ok(CallbackResolution::Cancelled(CancelReason::MissingOrderId));
        };

        let user_id = match self.order_owner(order_id).await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                warn!(order_id, "Cancel callback for unknown order, state unchanged");
                return Ok(CANCELLED);
            }
            Err(e) => {
                warn!(order_id, error = %e, "Could not resolve cancelled order, state unchanged");
                return Ok(CANCELLED);
            }
        };

        let mut tx = self.store.begin().await?;
        match apply_cancellation(tx.as_mut(), order_id, user_id).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(CANCELLED)
            }
            Err(e) => {
                abort(tx).await;
                Err(e)
            }
        }
    }
}

async fn apply_cancellation(
    tx: &mut dyn LeadTransaction,
    order_id: &str,
    user_id: Uuid,
) -> Result<(), CallbackError> {
    let Some(payment) = tx.lock_payment_by_order(order_id).await? else {
        warn!(order_id, "No local payment for cancelled order");
        return Ok(());
    };
    if payment.user_id != user_id {
        warn!(order_id, "Order notes do not match the local payment owner");
        return Ok(());
    }
    if payment.status.is_terminal() {
        debug!(order_id, status = %payment.status, "Cancel for finalized payment, state unchanged");
        return Ok(());
    }

    let applied = tx
        .finalize_payment(PaymentFinalization {
            payment_id: payment.id,
            status: PaymentStatus::Cancelled,
            gateway_payment_id: None,
            gateway_signature: None,
        })
        .await?;
    if applied {
        tx.set_user_payment_status(user_id, UserPaymentStatus::Failed)
            .await?;
        info!(order_id, "Payment cancelled");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{CheckoutSession, SubmitLead, VerifyCallback};
    use crate::testing::{
        MemoryGateway, MemoryStore, SIGNING_SECRET, checkout_config, signing_config, submission,
    };
    use leadpay_sdk::objects::VerifyCallbackParams;
    use leadpay_sdk::signature::sign_callback;
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryStore>, Arc<MemoryGateway>, CheckoutProcessor, CheckoutSession) {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(MemoryGateway::default());
        let processor = CheckoutProcessor::new(store.clone(), gateway.clone());
        let session = processor
            .process(SubmitLead {
                submission: submission("a@x.com", "9999999999"),
                checkout: checkout_config(),
            })
            .await
            .unwrap();
        (store, gateway, processor, session)
    }

    fn cancel(order_id: &str) -> CancelCallback {
        CancelCallback {
            order_id: Some(order_id.to_owned()),
        }
    }

    #[tokio::test]
    async fn test_cancel_marks_cancelled_and_failed() {
        let (store, _gateway, processor, session) = setup().await;
        let resolution = processor.process(cancel(&session.order_id)).await.unwrap();

        assert_eq!(resolution, CANCELLED);
        assert_eq!(
            resolution.destination(&checkout_config()).as_str(),
            "http://localhost:5173/?reason=user_cancelled"
        );
        let payment = store.payment(session.payment_id).await.unwrap();
        let user = store.user(session.user_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Cancelled);
        assert_eq!(user.payment_status, UserPaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_missing_order_id() {
        let (_store, _gateway, processor, _session) = setup().await;
        for order_id in [None, Some(String::new())] {
            let resolution = processor.process(CancelCallback { order_id }).await.unwrap();
            assert_eq!(
                resolution,
                CallbackResolution::Cancelled(CancelReason::MissingOrderId)
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_order_still_redirects() {
        let (store, gateway, processor, session) = setup().await;
        assert_eq!(
            processor.process(cancel("order_missing")).await.unwrap(),
            CANCELLED
        );

        gateway.set_unavailable(true);
        assert_eq!(
            processor.process(cancel(&session.order_id)).await.unwrap(),
            CANCELLED
        );
        let payment = store.payment(session.payment_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Created);
    }

    #[tokio::test]
    async fn test_cancel_after_payment_keeps_paid() {
        let (store, _gateway, processor, session) = setup().await;
        processor
            .process(VerifyCallback {
                params: VerifyCallbackParams {
                    order_id: Some(session.order_id.clone()),
                    payment_id: Some("pay_1".to_owned()),
                    signature: Some(sign_callback(&session.order_id, "pay_1", SIGNING_SECRET)),
                },
                signing: signing_config(),
            })
            .await
            .unwrap();

        processor.process(cancel(&session.order_id)).await.unwrap();

        let payment = store.payment(session.payment_id).await.unwrap();
        let user = store.user(session.user_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(user.payment_status, UserPaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let (store, _gateway, processor, session) = setup().await;
        store.fail_commits(true);

        let err = processor.process(cancel(&session.order_id)).await.unwrap_err();
        assert!(matches!(err, CallbackError::Store(_)));
        let payment = store.payment(session.payment_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Created);
    }
}
