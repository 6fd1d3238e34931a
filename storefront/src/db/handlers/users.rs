use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    types::UserId,
};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, email, username, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, password_hash, is_admin, wallet_balance, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(request.is_admin)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, email, username, password_hash, is_admin, wallet_balance, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, email, username, password_hash, is_admin, wallet_balance, created_at, updated_at
            FROM users
            ORDER BY created_at DESC, id DESC
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, email, username, password_hash, is_admin, wallet_balance, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    /// Add `amount` to the user's wallet, returning the new balance
    #[instrument(skip(self), err)]
    pub async fn credit_wallet(&mut self, user_id: UserId, amount: Decimal) -> Result<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE users
            SET wallet_balance = wallet_balance + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING wallet_balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        debug!("Credited {} to user {}, balance now {}", amount, user_id, balance);
        Ok(balance)
    }

    /// Take `amount` from the user's wallet if it holds at least that much.
    ///
    /// Returns the new balance, or `None` when the balance is insufficient (or the user is gone),
    /// in which case nothing was written.
    #[instrument(skip(self), err)]
    pub async fn debit_wallet(&mut self, user_id: UserId, amount: Decimal) -> Result<Option<Decimal>> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE users
            SET wallet_balance = wallet_balance - $2, updated_at = NOW()
            WHERE id = $1 AND wallet_balance >= $2
            RETURNING wallet_balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(balance)
    }

    /// Create the account as an admin, or promote it and reset its password if it already exists
    #[instrument(skip(self, password_hash), err)]
    pub async fn upsert_admin(&mut self, email: &str, username: &str, password_hash: &str) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, email, username, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash, is_admin = TRUE, updated_at = NOW()
            RETURNING id, email, username, password_hash, is_admin, wallet_balance, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }
}
