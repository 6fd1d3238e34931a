use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::purchases::{PurchaseCreateDBRequest, PurchaseDBResponse},
    },
    types::{PurchaseId, UserId},
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing purchases
#[derive(Debug, Clone)]
pub struct PurchaseFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
}

impl PurchaseFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, user_id: None }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

pub struct Purchases<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Purchases<'c> {
    type CreateRequest = PurchaseCreateDBRequest;
    type Response = PurchaseDBResponse;
    type Id = PurchaseId;
    type Filter = PurchaseFilter;

    #[instrument(skip(self, request), fields(user_id = %request.user_id, product_id = %request.product_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let purchase = sqlx::query_as::<_, PurchaseDBResponse>(
            r#"
            INSERT INTO purchases (id, user_id, product_id, product_name, amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, product_id, product_name, amount, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.product_id)
        .bind(&request.product_name)
        .bind(request.amount)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(purchase)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let purchase = sqlx::query_as::<_, PurchaseDBResponse>(
            r#"
            SELECT id, user_id, product_id, product_name, amount, created_at
            FROM purchases
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(purchase)
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let purchases = sqlx::query_as::<_, PurchaseDBResponse>(
            r#"
            SELECT id, user_id, product_id, product_name, amount, created_at
            FROM purchases
            WHERE ($1::UUID IS NULL OR user_id = $1)
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(purchases)
    }
}

impl<'c> Purchases<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
