use crate::{
    db::models::blog_posts::BlogPostDBResponse,
    types::{BlogPostId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPostCreate {
    pub title: String,
    pub content: String,
    /// Defaults to true
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPostResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BlogPostId,
    pub title: String,
    pub content: String,
    #[schema(value_type = String, format = "uuid")]
    pub author_id: UserId,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing blog posts
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListBlogPostsQuery {
    /// Number of items to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    /// Maximum number of items to return
    #[param(default = 100, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,
}

impl From<BlogPostDBResponse> for BlogPostResponse {
    fn from(db: BlogPostDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            content: db.content,
            author_id: db.author_id,
            is_published: db.is_published,
            created_at: db.created_at,
        }
    }
}
