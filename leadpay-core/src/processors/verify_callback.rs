//! Success callback verification.
//!
//! The callback is untrusted: it can be forged, replayed, or malformed.
//! The owning user is recovered from the gateway order's notes, the
//! signature decides between `paid` and `failed`, and the transition is
//! applied to the locked payment row only while it is still `created`.

use kanau::processor::Processor;
use leadpay_sdk::objects::{CancelReason, VerifyCallbackParams};
use leadpay_sdk::signature::is_authentic;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CallbackError, CallbackResolution, CheckoutProcessor};
use crate::config::SigningConfig;
use crate::entities::payment::PaymentFinalization;
use crate::entities::{PaymentStatus, UserPaymentStatus};
use crate::store::{LeadTransaction, abort};

#[derive(Debug, Clone)]
pub struct VerifyCallback {
    pub params: VerifyCallbackParams,
    pub signing: SigningConfig,
}

/// A complete callback whose owner is known.
struct Verified<'a> {
    user_id: Uuid,
    order_id: &'a str,
    payment_id: &'a str,
    signature: &'a str,
    authentic: bool,
}

impl Processor<VerifyCallback> for CheckoutProcessor {
    type Output = CallbackResolution;
    type Error = CallbackError;

    #[tracing::instrument(skip_all, err, name = "VerifyCallback")]
    async fn process(&self, cmd: VerifyCallback) -> Result<CallbackResolution, CallbackError> {
        let Some((order_id, payment_id, signature)) = cmd.params.complete() else {
            warn!(params = ?cmd.params, "Verify callback is missing parameters");
            return Ok(CallbackResolution::Cancelled(CancelReason::MissingParams));
        };

        let authentic = is_authentic(order_id, payment_id, signature, cmd.signing.secret_bytes());

        let Some(user_id) = self.order_owner(order_id).await? else {
            warn!(order_id, "Verify callback for unknown order or order without owner");
            return Ok(CallbackResolution::Cancelled(CancelReason::InvalidOrder));
        };

        let verified = Verified {
            user_id,
            order_id,
            payment_id,
            signature,
            authentic,
        };

        let mut tx = self.store.begin().await?;
        match apply_verification(tx.as_mut(), &verified).await {
            Ok(resolution) => {
                tx.commit().await?;
                Ok(resolution)
            }
            Err(e) => {
                abort(tx).await;
                Err(e)
            }
        }
    }
}

async fn apply_verification(
    tx: &mut dyn LeadTransaction,
    v: &Verified<'_>,
) -> Result<CallbackResolution, CallbackError> {
    let Some(payment) = tx.lock_payment_by_order(v.order_id).await? else {
        warn!(order_id = v.order_id, "No local payment for verified order");
        return Ok(CallbackResolution::Cancelled(CancelReason::InvalidOrder));
    };
    if payment.user_id != v.user_id {
        warn!(
            order_id = v.order_id,
            payment_user = %payment.user_id,
            order_user = %v.user_id,
            "Order notes do not match the local payment owner"
        );
        return Ok(CallbackResolution::Cancelled(CancelReason::InvalidOrder));
    }

    if payment.status.is_terminal() {
        debug!(
            order_id = v.order_id,
            status = %payment.status,
            authentic = v.authentic,
            "Callback for finalized payment, state unchanged"
        );
        return Ok(match (v.authentic, payment.status) {
            (true, PaymentStatus::Paid) => CallbackResolution::Paid {
                payment_id: payment
                    .gateway_payment_id
                    .unwrap_or_else(|| v.payment_id.to_owned()),
            },
            (true, _) => CallbackResolution::Cancelled(CancelReason::PaymentClosed),
            (false, _) => CallbackResolution::Cancelled(CancelReason::SignatureFailed),
        });
    }

    let (finalization, user_status) = if v.authentic {
        (
            PaymentFinalization {
                payment_id: payment.id,
                status: PaymentStatus::Paid,
                gateway_payment_id: Some(v.payment_id.to_owned()),
                gateway_signature: Some(v.signature.to_owned()),
            },
            UserPaymentStatus::Completed,
        )
    } else {
        (
            PaymentFinalization {
                payment_id: payment.id,
                status: PaymentStatus::Failed,
                gateway_payment_id: None,
                gateway_signature: None,
            },
            UserPaymentStatus::Failed,
        )
    };

    if tx.finalize_payment(finalization).await? {
        tx.set_user_payment_status(v.user_id, user_status).await?;
    }

    if v.authentic {
        info!(order_id = v.order_id, payment_id = v.payment_id, "Payment verified");
        Ok(CallbackResolution::Paid {
            payment_id: v.payment_id.to_owned(),
        })
    } else {
        warn!(order_id = v.order_id, "Payment signature verification failed");
        Ok(CallbackResolution::Cancelled(CancelReason::SignatureFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{CheckoutSession, SubmitLead};
    use crate::testing::{
        MemoryGateway, MemoryStore, SIGNING_SECRET, checkout_config, signing_config, submission,
    };
    use leadpay_sdk::objects::{GatewayOrder, OrderNotes};
    use leadpay_sdk::signature::sign_callback;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        gateway: Arc<MemoryGateway>,
        processor: CheckoutProcessor,
        session: CheckoutSession,
    }

    async fn fixture() -> Fixture {
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
        Fixture {
            store,
            gateway,
            processor,
            session,
        }
    }

    fn callback(order_id: &str, payment_id: &str, signature: &str) -> VerifyCallback {
        VerifyCallback {
            params: VerifyCallbackParams {
                order_id: Some(order_id.to_owned()),
                payment_id: Some(payment_id.to_owned()),
                signature: Some(signature.to_owned()),
            },
            signing: signing_config(),
        }
    }

    fn signed(order_id: &str, payment_id: &str) -> VerifyCallback {
        let signature = sign_callback(order_id, payment_id, SIGNING_SECRET);
        callback(order_id, payment_id, &signature)
    }

    impl Fixture {
        async fn statuses(&self) -> (PaymentStatus, UserPaymentStatus) {
            let payment = self.store.payment(self.session.payment_id).await.unwrap();
            let user = self.store.user(self.session.user_id).await.unwrap();
            (payment.status, user.payment_status)
        }
    }

    #[tokio::test]
    async fn test_authentic_callback_marks_paid_and_completed() {
        let f = fixture().await;
        let resolution = f
            .processor
            .process(signed(&f.session.order_id, "pay_1"))
            .await
            .unwrap();

        assert_eq!(
            resolution,
            CallbackResolution::Paid {
                payment_id: "pay_1".to_owned()
            }
        );
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Paid, UserPaymentStatus::Completed)
        );
        let payment = f.store.payment(f.session.payment_id).await.unwrap();
        assert_eq!(payment.gateway_payment_id.as_deref(), Some("pay_1"));
        assert_eq!(
            payment.gateway_signature,
            Some(sign_callback(&f.session.order_id, "pay_1", SIGNING_SECRET))
        );
        assert_eq!(
            resolution.destination(&checkout_config()).as_str(),
            "http://localhost:5173/success?payment_id=pay_1"
        );
    }

    #[tokio::test]
    async fn test_wrong_signature_marks_both_failed() {
        let f = fixture().await;
        let forged = sign_callback(&f.session.order_id, "pay_1", b"not-the-secret");
        let resolution = f
            .processor
            .process(callback(&f.session.order_id, "pay_1", &forged))
            .await
            .unwrap();

        assert_eq!(
            resolution,
            CallbackResolution::Cancelled(CancelReason::SignatureFailed)
        );
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Failed, UserPaymentStatus::Failed)
        );
        let payment = f.store.payment(f.session.payment_id).await.unwrap();
        assert_eq!(payment.gateway_payment_id, None);
    }

    #[tokio::test]
    async fn test_repeated_callback_is_idempotent() {
        let f = fixture().await;
        for _ in 0..2 {
            let resolution = f
                .processor
                .process(signed(&f.session.order_id, "pay_1"))
                .await
                .unwrap();
            assert!(matches!(resolution, CallbackResolution::Paid { .. }));
        }
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Paid, UserPaymentStatus::Completed)
        );
    }

    #[tokio::test]
    async fn test_concurrent_callbacks_commit_one_terminal_state() {
        let f = fixture().await;
        let order_id = f.session.order_id.clone();

        let (genuine, forged) = tokio::join!(
            f.processor.process(signed(&order_id, "pay_1")),
            f.processor.process(callback(&order_id, "pay_1", &"0".repeat(64))),
        );

        assert_eq!(
            forged.unwrap(),
            CallbackResolution::Cancelled(CancelReason::SignatureFailed)
        );
        let genuine = genuine.unwrap();
        let statuses = f.statuses().await;
        let paid_first = statuses == (PaymentStatus::Paid, UserPaymentStatus::Completed);
        let forged_first = statuses == (PaymentStatus::Failed, UserPaymentStatus::Failed);
        assert!(paid_first || forged_first, "records disagree: {statuses:?}");
        if paid_first {
            assert_eq!(
                genuine,
                CallbackResolution::Paid {
                    payment_id: "pay_1".to_owned()
                }
            );
        } else {
            assert_eq!(
                genuine,
                CallbackResolution::Cancelled(CancelReason::PaymentClosed)
            );
        }
    }

    #[tokio::test]
    async fn test_terminal_state_is_never_overridden() {
        let f = fixture().await;
        f.processor
            .process(signed(&f.session.order_id, "pay_1"))
            .await
            .unwrap();

        let resolution = f
            .processor
            .process(callback(&f.session.order_id, "pay_1", "deadbeef"))
            .await
            .unwrap();
        assert_eq!(
            resolution,
            CallbackResolution::Cancelled(CancelReason::SignatureFailed)
        );
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Paid, UserPaymentStatus::Completed)
        );
    }

    #[tokio::test]
    async fn test_authentic_callback_after_failure_is_closed() {
        let f = fixture().await;
        f.processor
            .process(callback(&f.session.order_id, "pay_1", "deadbeef"))
            .await
            .unwrap();

        let resolution = f
            .processor
            .process(signed(&f.session.order_id, "pay_2"))
            .await
            .unwrap();
        assert_eq!(
            resolution,
            CallbackResolution::Cancelled(CancelReason::PaymentClosed)
        );
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Failed, UserPaymentStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_missing_params_change_nothing() {
        let f = fixture().await;
        let mut cmd = signed(&f.session.order_id, "pay_1");
        cmd.params.payment_id = None;

        let resolution = f.processor.process(cmd).await.unwrap();
        assert_eq!(
            resolution,
            CallbackResolution::Cancelled(CancelReason::MissingParams)
        );
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Created, UserPaymentStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_unknown_order_is_invalid() {
        let f = fixture().await;
        let resolution = f
            .processor
            .process(signed("order_missing", "pay_1"))
            .await
            .unwrap();
        assert_eq!(
            resolution,
            CallbackResolution::Cancelled(CancelReason::InvalidOrder)
        );
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Created, UserPaymentStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_order_owned_by_someone_else_is_invalid() {
        let f = fixture().await;
        f.gateway.insert_order(GatewayOrder {
            id: "order_foreign".to_owned(),
            amount: 50000,
            currency: "INR".to_owned(),
            receipt: None,
            status: "created".to_owned(),
            notes: Some(OrderNotes::for_user(Uuid::now_v7(), "B", "b@x.com")),
        });

        let resolution = f
            .processor
            .process(signed("order_foreign", "pay_1"))
            .await
            .unwrap();
        assert_eq!(
            resolution,
            CallbackResolution::Cancelled(CancelReason::InvalidOrder)
        );
    }

    #[tokio::test]
    async fn test_gateway_outage_is_an_error_without_writes() {
        let f = fixture().await;
        f.gateway.set_unavailable(true);

        let err = f
            .processor
            .process(signed(&f.session.order_id, "pay_1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CallbackError::Gateway(_)));
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Created, UserPaymentStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_no_partial_update() {
        let f = fixture().await;
        f.store.fail_commits(true);

        let err = f
            .processor
            .process(signed(&f.session.order_id, "pay_1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CallbackError::Store(_)));
        assert_eq!(
            f.statuses().await,
            (PaymentStatus::Created, UserPaymentStatus::Pending)
        );
    }
}
