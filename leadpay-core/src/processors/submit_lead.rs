//! Order creation for a validated lead.

use kanau::processor::Processor;
use leadpay_sdk::checkout::{CallbackUrls, CheckoutLink};
use leadpay_sdk::objects::{CreateGatewayOrder, LeadSubmission, OrderNotes};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use super::CheckoutProcessor;
use crate::config::CheckoutConfig;
use crate::entities::payment::PaymentInsert;
use crate::entities::user::UserInsert;
use crate::gateway::GatewayError;
use crate::store::{LeadTransaction, StoreError, abort};

/// Create a pending user, its gateway order and payment record.
#[derive(Debug, Clone)]
pub struct SubmitLead {
    pub submission: LeadSubmission,
    pub checkout: CheckoutConfig,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub user_id: Uuid,
    pub payment_id: Uuid,
    pub order_id: String,
    /// Hosted checkout page the payer is redirected to.
    pub checkout_url: Url,
}

#[derive(Debug, Error)]
pub enum SubmitLeadError {
    #[error("User with this email or mobile number already exists")]
    Duplicate,

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("invalid callback url: {0}")]
    InvalidCallbackUrl(#[from] url::ParseError),
}

impl From<StoreError> for SubmitLeadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => SubmitLeadError::Duplicate,
            other => SubmitLeadError::Store(other),
        }
    }
}

/// Receipt shown on the gateway dashboard, e.g.
/// `rcpt_7c1e9b5a8f0e4d21a3b6c9d0_3fa9c1`.
fn new_receipt(user_id: Uuid) -> String {
    let simple = user_id.simple().to_string();
    let suffix: [u8; 3] = rand::random();
    format!("rcpt_{}_{}", &simple[8..], hex::encode(suffix))
}

impl Processor<SubmitLead> for CheckoutProcessor {
    type Output = CheckoutSession;
    type Error = SubmitLeadError;

    #[tracing::instrument(skip_all, err, name = "SubmitLead")]
    async fn process(&self, cmd: SubmitLead) -> Result<CheckoutSession, SubmitLeadError> {
        let mut tx = self.store.begin().await?;
        match self.create_checkout(tx.as_mut(), &cmd).await {
            Ok(session) => {
                tx.commit().await?;
                info!(
                    user_id = %session.user_id,
                    order_id = %session.order_id,
                    "Lead submitted, checkout created"
                );
                Ok(session)
            }
            Err(e) => {
                abort(tx).await;
                Err(e)
            }
        }
    }
}

impl CheckoutProcessor {
    async fn create_checkout(
        &self,
        tx: &mut dyn LeadTransaction,
        cmd: &SubmitLead,
    ) -> Result<CheckoutSession, SubmitLeadError> {
        let SubmitLead {
            submission,
            checkout,
        } = cmd;

        if let Some(existing) = tx
            .find_user_by_contact(&submission.email, &submission.mobile)
            .await?
        {
            warn!(user_id = %existing.id, "Rejected duplicate lead");
            return Err(SubmitLeadError::Duplicate);
        }

        let user = tx
            .insert_user(UserInsert {
                id: Uuid::now_v7(),
                name: submission.name.clone(),
                mobile: submission.mobile.clone(),
                email: submission.email.clone(),
                city: submission.city.clone(),
                experience: submission.experience.into(),
            })
            .await?;

        let receipt = new_receipt(user.id);
        let order = self
            .gateway
            .create_order(CreateGatewayOrder {
                amount: checkout.amount,
                currency: checkout.currency.clone(),
                receipt: receipt.clone(),
                notes: OrderNotes::for_user(user.id, &user.name, &user.email),
            })
            .await?;

        let payment = tx
            .insert_payment(PaymentInsert {
                id: Uuid::now_v7(),
                user_id: user.id,
                gateway_order_id: order.id.clone(),
                amount: order.amount,
                currency: order.currency.clone(),
                receipt,
            })
            .await?;
        tx.link_payment(user.id, payment.id).await?;

        let callbacks = CallbackUrls::new(&checkout.backend_url, &order.id)?;
        let checkout_url = CheckoutLink {
            key_id: self.gateway.key_id(),
            order_id: &order.id,
            merchant_name: &checkout.merchant_name,
            prefill_name: &user.name,
            prefill_email: &user.email,
            prefill_contact: &user.mobile,
            callbacks: &callbacks,
        }
        .to_url(&checkout.checkout_page);

        Ok(CheckoutSession {
            user_id: user.id,
            payment_id: payment.id,
            order_id: order.id,
            checkout_url,
        })
    }
}
