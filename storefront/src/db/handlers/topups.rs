use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::topups::{TopUpCreateDBRequest, TopUpDBResponse, TopUpStatus},
    },
    types::{TopUpRequestId, UserId},
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing top-up requests
#[derive(Debug, Clone)]
pub struct TopUpFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
    pub status: Option<TopUpStatus>,
}

impl TopUpFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            user_id: None,
            status: None,
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: Option<TopUpStatus>) -> Self {
        self.status = status;
        self
    }
}

pub struct TopUps<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for TopUps<'c> {
    type CreateRequest = TopUpCreateDBRequest;
    type Response = TopUpDBResponse;
    type Id = TopUpRequestId;
    type Filter = TopUpFilter;

    #[instrument(skip(self, request), fields(user_id = %request.user_id, amount = %request.amount), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let topup = sqlx::query_as::<_, TopUpDBResponse>(
            r#"
            INSERT INTO topup_requests (id, user_id, amount, receipt_data)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, amount, receipt_data, status, admin_notes, created_at, processed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.amount)
        .bind(&request.receipt_data)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(topup)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let topup = sqlx::query_as::<_, TopUpDBResponse>(
            r#"
            SELECT id, user_id, amount, receipt_data, status, admin_notes, created_at, processed_at
            FROM topup_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(topup)
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let topups = sqlx::query_as::<_, TopUpDBResponse>(
            r#"
            SELECT id, user_id, amount, receipt_data, status, admin_notes, created_at, processed_at
            FROM topup_requests
            WHERE ($1::UUID IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            OFFSET $3
            LIMIT $4
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(topups)
    }
}

impl<'c> TopUps<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Move a pending request to `status`, stamping `processed_at`.
    ///
    /// Only matches rows still in `pending`, so at most one caller wins; everyone else gets `None`.
    #[instrument(skip(self, admin_notes), err)]
    pub async fn mark_processed(
        &mut self,
        id: TopUpRequestId,
        status: TopUpStatus,
        admin_notes: Option<&str>,
    ) -> Result<Option<TopUpDBResponse>> {
        let topup = sqlx::query_as::<_, TopUpDBResponse>(
            r#"
            UPDATE topup_requests
            SET status = $2, admin_notes = $3, processed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, user_id, amount, receipt_data, status, admin_notes, created_at, processed_at
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(admin_notes)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(topup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        errors::DbError,
        handlers::Users,
        models::users::UserCreateDBRequest,
    };
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn create_user(pool: &PgPool, email: &str) -> UserId {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                username: "buyer".to_string(),
                password_hash: "hash".to_string(),
                is_admin: false,
            })
            .await
            .expect("Failed to create user")
            .id
    }

    fn create_request(user_id: UserId, amount: i64) -> TopUpCreateDBRequest {
        TopUpCreateDBRequest {
            user_id,
            amount: Decimal::from(amount),
            receipt_data: "aGVsbG8=".to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_topup_is_pending(pool: PgPool) {
        let user_id = create_user(&pool, "a@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = TopUps::new(&mut conn);

        let topup = repo.create(&create_request(user_id, 50)).await.unwrap();
        assert_eq!(topup.status, TopUpStatus::Pending);
        assert!(topup.processed_at.is_none());
        assert!(topup.admin_notes.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_non_positive_amount_is_check_violation(pool: PgPool) {
        let user_id = create_user(&pool, "a@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = TopUps::new(&mut conn);

        let result = repo.create(&create_request(user_id, 0)).await;
        assert!(matches!(result, Err(DbError::CheckViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_mark_processed_only_once(pool: PgPool) {
        let user_id = create_user(&pool, "a@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = TopUps::new(&mut conn);
        let topup = repo.create(&create_request(user_id, 50)).await.unwrap();

        let approved = repo
            .mark_processed(topup.id, TopUpStatus::Approved, Some("looks good"))
            .await
            .unwrap()
            .expect("First claim should win");
        assert_eq!(approved.status, TopUpStatus::Approved);
        assert_eq!(approved.admin_notes.as_deref(), Some("looks good"));
        assert!(approved.processed_at.is_some());

        let second = repo.mark_processed(topup.id, TopUpStatus::Rejected, None).await.unwrap();
        assert!(second.is_none());

        let stored = repo.get_by_id(topup.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TopUpStatus::Approved);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_user_and_status(pool: PgPool) {
        let alice = create_user(&pool, "alice@example.com").await;
        let bob = create_user(&pool, "bob@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = TopUps::new(&mut conn);

        let first = repo.create(&create_request(alice, 10)).await.unwrap();
        repo.create(&create_request(alice, 20)).await.unwrap();
        repo.create(&create_request(bob, 30)).await.unwrap();
        repo.mark_processed(first.id, TopUpStatus::Rejected, Some("")).await.unwrap();

        let alices = repo.list(&TopUpFilter::new(0, 100).for_user(alice)).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|t| t.user_id == alice));

        let pending = repo
            .list(&TopUpFilter::new(0, 100).with_status(Some(TopUpStatus::Pending)))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let all = repo.list(&TopUpFilter::new(0, 100)).await.unwrap();
        assert_eq!(all.len(), 3);
        for pair in all.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }
}
