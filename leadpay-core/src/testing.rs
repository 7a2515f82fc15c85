//! In-memory store and gateway for tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for the server's handler tests.

#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use leadpay_sdk::checkout::DEFAULT_CHECKOUT_URL;
use leadpay_sdk::client::{ClientError, StatusCode};
use leadpay_sdk::objects::{CreateGatewayOrder, Experience, GatewayOrder, LeadSubmission};
use tokio::sync::OwnedMutexGuard;
use url::Url;
use uuid::Uuid;

use crate::config::{CheckoutConfig, SigningConfig};
use crate::entities::now_utc;
use crate::entities::payment::{Payment, PaymentFinalization, PaymentInsert};
use crate::entities::user::{User, UserInsert, UserWithPayment};
use crate::entities::{PaymentStatus, UserPaymentStatus};
use crate::gateway::{GatewayError, PaymentGateway};
use crate::store::{LeadStore, LeadTransaction, StoreError};

pub const SIGNING_SECRET: &[u8] = b"test_signing_secret";

pub fn signing_config() -> SigningConfig {
    SigningConfig::new(SIGNING_SECRET)
}

pub fn checkout_config() -> CheckoutConfig {
    CheckoutConfig {
        amount: 50000,
        currency: "INR".to_owned(),
        merchant_name: "Manga Course".to_owned(),
        backend_url: Url::parse("http://localhost:5000").expect("valid url"),
        success_url: Url::parse("http://localhost:5173/success").expect("valid url"),
        cancel_url: Url::parse("http://localhost:5173").expect("valid url"),
        checkout_page: Url::parse(DEFAULT_CHECKOUT_URL).expect("valid url"),
    }
}

pub fn submission(email: &str, mobile: &str) -> LeadSubmission {
    LeadSubmission {
        name: "Asha".to_owned(),
        mobile: mobile.to_owned(),
        email: email.to_owned(),
        city: "Pune".to_owned(),
        experience: Experience::None,
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    payments: HashMap<Uuid, Payment>,
}

/// [`LeadStore`] backed by two hash maps.
///
/// A transaction holds the store's lock until it ends and works on a copy,
/// which is written back on commit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Arc<tokio::sync::Mutex<Tables>>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Make every following commit fail, discarding the transaction.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub async fn user(&self, id: Uuid) -> Option<User> {
        self.tables.lock().await.users.get(&id).cloned()
    }

    pub async fn payment(&self, id: Uuid) -> Option<Payment> {
        self.tables.lock().await.payments.get(&id).cloned()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    pub async fn payment_count(&self) -> usize {
        self.tables.lock().await.payments.len()
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LeadTransaction>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            fail_commits: self.fail_commits.clone(),
        }))
    }

    async fn user_with_payment(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserWithPayment>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&user_id).map(|user| UserWithPayment {
            user: user.clone(),
            payment: user
                .payment_id
                .and_then(|id| tables.payments.get(&id).cloned()),
        }))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    fail_commits: Arc<AtomicBool>,
}

#[async_trait]
impl LeadTransaction for MemoryTransaction {
    async fn find_user_by_contact(
        &mut self,
        email: &str,
        mobile: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .staged
            .users
            .values()
            .find(|u| u.email == email || u.mobile == mobile)
            .cloned())
    }

    async fn insert_user(&mut self, insert: UserInsert) -> Result<User, StoreError> {
        let taken = self
            .staged
            .users
            .values()
            .any(|u| u.email == insert.email || u.mobile == insert.mobile);
        if taken {
            return Err(StoreError::Duplicate);
        }
        let now = now_utc();
        let user = User {
            id: insert.id,
            name: insert.name,
            mobile: insert.mobile,
            email: insert.email,
            city: insert.city,
            experience: insert.experience,
            payment_status: UserPaymentStatus::Pending,
            payment_id: None,
            created_at: now,
            updated_at: now,
        };
        self.staged.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn insert_payment(&mut self, insert: PaymentInsert) -> Result<Payment, StoreError> {
        let taken = self
            .staged
            .payments
            .values()
            .any(|p| p.gateway_order_id == insert.gateway_order_id);
        if taken {
            return Err(StoreError::Database(sqlx::Error::Protocol(format!(
                "duplicate gateway order id {}",
                insert.gateway_order_id
            ))));
        }
        let now = now_utc();
        let payment = Payment {
            id: insert.id,
            user_id: insert.user_id,
            gateway_order_id: insert.gateway_order_id,
            amount: insert.amount,
            currency: insert.currency,
            receipt: insert.receipt,
            status: PaymentStatus::Created,
            gateway_payment_id: None,
            gateway_signature: None,
            created_at: now,
            updated_at: now,
        };
        self.staged.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn link_payment(&mut self, user_id: Uuid, payment_id: Uuid) -> Result<(), StoreError> {
        if let Some(user) = self.staged.users.get_mut(&user_id) {
            user.payment_id = Some(payment_id);
            user.updated_at = now_utc();
        }
        Ok(())
    }

    async fn lock_payment_by_order(
        &mut self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .staged
            .payments
            .values()
            .find(|p| p.gateway_order_id == gateway_order_id)
            .cloned())
    }

    async fn finalize_payment(
        &mut self,
        update: PaymentFinalization,
    ) -> Result<bool, StoreError> {
        match self.staged.payments.get_mut(&update.payment_id) {
            Some(payment) if payment.status == PaymentStatus::Created => {
                payment.status = update.status;
                payment.gateway_payment_id = update.gateway_payment_id;
                payment.gateway_signature = update.gateway_signature;
                payment.updated_at = now_utc();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_user_payment_status(
        &mut self,
        user_id: Uuid,
        status: UserPaymentStatus,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.staged.users.get_mut(&user_id) {
            user.payment_status = status;
            user.updated_at = now_utc();
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let MemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// [`PaymentGateway`] keeping orders in a map.
#[derive(Debug)]
pub struct MemoryGateway {
    key_id: String,
    orders: Mutex<HashMap<String, GatewayOrder>>,
    next_order: AtomicU64,
    unavailable: AtomicBool,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self {
            key_id: "rzp_test_memory".to_owned(),
            orders: Mutex::new(HashMap::new()),
            next_order: AtomicU64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }
}

impl MemoryGateway {
    /// Make every following call fail as if the gateway were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Register an order created outside of this server.
    pub fn insert_order(&self, order: GatewayOrder) {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(order.id.clone(), order);
    }

    pub fn order(&self, order_id: &str) -> Option<GatewayOrder> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(order_id)
            .cloned()
    }

    pub fn order_count(&self) -> usize {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Client(ClientError::Api {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "connection refused".to_owned(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for MemoryGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(
        &self,
        request: CreateGatewayOrder,
    ) -> Result<GatewayOrder, GatewayError> {
        self.check_available()?;
        let n = self.next_order.fetch_add(1, Ordering::SeqCst);
        let order = GatewayOrder {
            id: format!("order_mem{n:010}"),
            amount: request.amount,
            currency: request.currency,
            receipt: Some(request.receipt),
            status: "created".to_owned(),
            notes: Some(request.notes),
        };
        self.insert_order(order.clone());
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Option<GatewayOrder>, GatewayError> {
        self.check_available()?;
        Ok(self.order(order_id))
    }
}
