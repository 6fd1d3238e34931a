use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::blog_posts::{BlogPostCreateDBRequest, BlogPostDBResponse},
    },
    types::BlogPostId,
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing blog posts
#[derive(Debug, Clone)]
pub struct BlogPostFilter {
    pub skip: i64,
    pub limit: i64,
    pub published_only: bool,
}

impl BlogPostFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            published_only: true,
        }
    }
}

pub struct BlogPosts<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for BlogPosts<'c> {
    type CreateRequest = BlogPostCreateDBRequest;
    type Response = BlogPostDBResponse;
    type Id = BlogPostId;
    type Filter = BlogPostFilter;

    #[instrument(skip(self, request), fields(author_id = %request.author_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let post = sqlx::query_as::<_, BlogPostDBResponse>(
            r#"
            INSERT INTO blog_posts (id, title, content, author_id, is_published)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, content, author_id, is_published, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(&request.content)
        .bind(request.author_id)
        .bind(request.is_published)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(post)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let post = sqlx::query_as::<_, BlogPostDBResponse>(
            r#"
            SELECT id, title, content, author_id, is_published, created_at
            FROM blog_posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(post)
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let posts = sqlx::query_as::<_, BlogPostDBResponse>(
            r#"
            SELECT id, title, content, author_id, is_published, created_at
            FROM blog_posts
            WHERE (is_published OR NOT $1)
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(filter.published_only)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(posts)
    }
}

impl<'c> BlogPosts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
