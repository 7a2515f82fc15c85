use crate::entities::PaymentStatus;
use crate::framework::DatabaseAccessor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub gateway_order_id: String,
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub status: PaymentStatus,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

/// Data for inserting a new payment attempt. New payments always start
/// `created`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInsert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Move a payment out of `created` into a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFinalization {
    pub payment_id: Uuid,
    pub status: PaymentStatus,
    /// Recorded only for `Paid`.
    pub gateway_payment_id: Option<String>,
    /// Recorded only for `Paid`.
    pub gateway_signature: Option<String>,
}

const PAYMENT_COLUMNS: &str = r#"
    id,
    user_id,
    gateway_order_id,
    amount,
    currency,
    receipt,
    status,
    gateway_payment_id,
    gateway_signature,
    created_at,
    updated_at
"#;

impl Payment {
    pub async fn find_by_id<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        payment_id: Uuid,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&sql)
            .bind(payment_id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:InsertPayment")]
    pub async fn insert(
        db: &mut impl DatabaseAccessor,
        insert: PaymentInsert,
    ) -> Result<Payment, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO payments (id, user_id, gateway_order_id, amount, currency, receipt)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PAYMENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Payment>(&sql)
            .bind(insert.id)
            .bind(insert.user_id)
            .bind(insert.gateway_order_id)
            .bind(insert.amount)
            .bind(insert.currency)
            .bind(insert.receipt)
            .fetch_one(db.acquire())
            .await
    }

    /// Fetch the payment for a gateway order and lock its row until the
    /// enclosing transaction ends, serializing concurrent callbacks for the
    /// same order.
    #[tracing::instrument(skip_all, err, name = "SQL:LockPaymentByOrder")]
    pub async fn lock_by_order(
        db: &mut impl DatabaseAccessor,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE gateway_order_id = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, Payment>(&sql)
            .bind(gateway_order_id)
            .fetch_optional(db.acquire())
            .await
    }

    /// Apply a terminal status. Only a `created` payment is updated; returns
    /// whether the row changed.
    #[tracing::instrument(skip_all, err, name = "SQL:FinalizePayment")]
    pub async fn finalize(
        db: &mut impl DatabaseAccessor,
        update: PaymentFinalization,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2,
                gateway_payment_id = $3,
                gateway_signature = $4,
                updated_at = NOW()
            WHERE id = $1 AND status = 'created'
            "#,
        )
        .bind(update.payment_id)
        .bind(update.status)
        .bind(update.gateway_payment_id)
        .bind(update.gateway_signature)
        .execute(db.acquire())
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
