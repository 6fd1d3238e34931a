use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::tickets::{TicketCreateDBRequest, TicketDBResponse},
    },
    types::{TicketId, UserId},
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing support tickets
#[derive(Debug, Clone)]
pub struct TicketFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
}

impl TicketFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, user_id: None }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

pub struct Tickets<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Tickets<'c> {
    type CreateRequest = TicketCreateDBRequest;
    type Response = TicketDBResponse;
    type Id = TicketId;
    type Filter = TicketFilter;

    #[instrument(skip(self, request), fields(user_id = %request.user_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let ticket = sqlx::query_as::<_, TicketDBResponse>(
            r#"
            INSERT INTO support_tickets (id, user_id, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, subject, message, status, responses, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.subject)
        .bind(&request.message)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ticket)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let ticket = sqlx::query_as::<_, TicketDBResponse>(
            r#"
            SELECT id, user_id, subject, message, status, responses, created_at
            FROM support_tickets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(ticket)
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let tickets = sqlx::query_as::<_, TicketDBResponse>(
            r#"
            SELECT id, user_id, subject, message, status, responses, created_at
            FROM support_tickets
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

        Ok(tickets)
    }
}

impl<'c> Tickets<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{handlers::Users, models::tickets::TicketStatus, models::users::UserCreateDBRequest};
    use sqlx::PgPool;

    async fn create_user(pool: &PgPool, email: &str) -> UserId {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                username: "customer".to_string(),
                password_hash: "hash".to_string(),
                is_admin: false,
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_new_ticket_is_open_without_replies(pool: PgPool) {
        let user_id = create_user(&pool, "a@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Tickets::new(&mut conn);

        let ticket = repo
            .create(&TicketCreateDBRequest {
                user_id,
                subject: "Key not working".to_string(),
                message: "The code says already redeemed".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.responses.0.is_empty());

        let fetched = repo.get_by_id(ticket.id).await.unwrap().expect("Ticket missing");
        assert_eq!(fetched.subject, "Key not working");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_tickets_per_user(pool: PgPool) {
        let alice = create_user(&pool, "alice@example.com").await;
        let bob = create_user(&pool, "bob@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Tickets::new(&mut conn);

        for (user_id, subject) in [(alice, "one"), (alice, "two"), (bob, "three")] {
            repo.create(&TicketCreateDBRequest {
                user_id,
                subject: subject.to_string(),
                message: "help".to_string(),
            })
            .await
            .unwrap();
        }

        let alices = repo.list(&TicketFilter::new(0, 100).for_user(alice)).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|t| t.user_id == alice));

        assert_eq!(repo.list(&TicketFilter::new(0, 100)).await.unwrap().len(), 3);
    }
}
