use crate::types::{BlogPostId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct BlogPostCreateDBRequest {
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub is_published: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct BlogPostDBResponse {
    pub id: BlogPostId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}
