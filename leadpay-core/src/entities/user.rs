use crate::entities::payment::Payment;
use crate::entities::{ExperienceLevel, UserPaymentStatus};
use crate::framework::{DatabaseAccessor, DatabaseProcessor};
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub city: String,
    pub experience: ExperienceLevel,
    pub payment_status: UserPaymentStatus,
    pub payment_id: Option<Uuid>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

/// Data for inserting a new user. New users always start `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInsert {
    pub id: Uuid,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub city: String,
    pub experience: ExperienceLevel,
}

/// A user together with its linked payment attempt, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithPayment {
    pub user: User,
    pub payment: Option<Payment>,
}

const USER_COLUMNS: &str = r#"
    id,
    name,
    mobile,
    email,
    city,
    experience,
    payment_status,
    payment_id,
    created_at,
    updated_at
"#;

impl User {
    /// Find a user sharing either the email or the mobile number.
    #[tracing::instrument(skip_all, err, name = "SQL:FindUserByContact")]
    pub async fn find_by_contact(
        db: &mut impl DatabaseAccessor,
        email: &str,
        mobile: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR mobile = $2 LIMIT 1"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(mobile)
            .fetch_optional(db.acquire())
            .await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:InsertUser")]
    pub async fn insert(
        db: &mut impl DatabaseAccessor,
        insert: UserInsert,
    ) -> Result<User, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (id, name, mobile, email, city, experience)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(insert.id)
            .bind(insert.name)
            .bind(insert.mobile)
            .bind(insert.email)
            .bind(insert.city)
            .bind(insert.experience)
            .fetch_one(db.acquire())
            .await
    }

    #[tracing::instrument(skip_all, err, name = "SQL:LinkUserPayment")]
    pub async fn link_payment(
        db: &mut impl DatabaseAccessor,
        user_id: Uuid,
        payment_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET payment_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(payment_id)
        .execute(db.acquire())
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, err, name = "SQL:SetUserPaymentStatus")]
    pub async fn set_payment_status(
        db: &mut impl DatabaseAccessor,
        user_id: Uuid,
        status: UserPaymentStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET payment_status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(status)
        .execute(db.acquire())
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Get a user and its linked payment by user id.
pub struct GetUserWithPayment {
    pub user_id: Uuid,
}

impl Processor<GetUserWithPayment> for DatabaseProcessor {
    type Output = Option<UserWithPayment>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserWithPayment")]
    async fn process(
        &self,
        query: GetUserWithPayment,
    ) -> Result<Option<UserWithPayment>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let Some(user) = sqlx::query_as::<_, User>(&sql)
            .bind(query.user_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let payment = match user.payment_id {
            Some(payment_id) => Payment::find_by_id(&self.pool, payment_id).await?,
            None => None,
        };

        Ok(Some(UserWithPayment { user, payment }))
    }
}
