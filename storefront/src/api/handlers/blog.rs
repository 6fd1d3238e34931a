use crate::{
    api::models::blog::{BlogPostCreate, BlogPostResponse, ListBlogPostsQuery},
    auth::permissions::{operation, resource, RequiresPermission},
    db::{
        handlers::{blog_posts::BlogPostFilter, BlogPosts, Repository},
        models::blog_posts::BlogPostCreateDBRequest,
    },
    errors::{Error, Result},
    types::BlogPostId,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

// GET /blog - Published posts
#[utoipa::path(
    get,
    path = "/blog",
    tag = "blog",
    summary = "List blog posts",
    description = "List published posts, newest first",
    params(ListBlogPostsQuery),
    responses(
        (status = 200, description = "Blog posts", body = [BlogPostResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_blog_posts(State(state): State<AppState>, Query(query): Query<ListBlogPostsQuery>) -> Result<Json<Vec<BlogPostResponse>>> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let posts = BlogPosts::new(&mut pool_conn).list(&BlogPostFilter::new(skip, limit)).await?;

    Ok(Json(posts.into_iter().map(BlogPostResponse::from).collect()))
}

// POST /blog - Publish a post (admin only)
#[utoipa::path(
    post,
    path = "/blog",
    tag = "blog",
    summary = "Create blog post",
    description = "Create a blog post authored by the caller (admin only)",
    request_body = BlogPostCreate,
    responses(
        (status = 201, description = "Post created", body = BlogPostResponse),
        (status = 400, description = "Title or content missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin access required"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn create_blog_post(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::BlogPosts, operation::CreateAll>,
    Json(data): Json<BlogPostCreate>,
) -> Result<(StatusCode, Json<BlogPostResponse>)> {
    if data.title.trim().is_empty() || data.content.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Title and content are required".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let post = BlogPosts::new(&mut pool_conn)
        .create(&BlogPostCreateDBRequest {
            title: data.title,
            content: data.content,
            author_id: current_user.id,
            is_published: data.is_published.unwrap_or(true),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(BlogPostResponse::from(post))))
}

// GET /blog/{post_id}
#[utoipa::path(
    get,
    path = "/blog/{post_id}",
    tag = "blog",
    summary = "Get blog post",
    description = "Get a published blog post by ID",
    params(
        ("post_id" = String, Path, description = "Blog post ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Blog post", body = BlogPostResponse),
        (status = 404, description = "Blog post not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_blog_post(State(state): State<AppState>, Path(post_id): Path<BlogPostId>) -> Result<Json<BlogPostResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // Drafts are indistinguishable from missing posts
    let post = BlogPosts::new(&mut pool_conn)
        .get_by_id(post_id)
        .await?
        .filter(|post| post.is_published)
        .ok_or_else(|| Error::NotFound {
            resource: "Blog post".to_string(),
            id: post_id.to_string(),
        })?;

    Ok(Json(BlogPostResponse::from(post)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_publishes_post(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;

        let response = app
            .post("/api/blog")
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&json!({ "title": "Summer sale", "content": "Everything 20% off" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let post: BlogPostResponse = response.json();
        assert_eq!(post.author_id, admin.id);
        assert!(post.is_published);

        // Public routes, no token needed
        let posts: Vec<BlogPostResponse> = app.get("/api/blog").await.json();
        assert_eq!(posts.len(), 1);

        let fetched: BlogPostResponse = app.get(&format!("/api/blog/{}", post.id)).await.json();
        assert_eq!(fetched.title, "Summer sale");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_customer_cannot_post(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;

        app.post("/api/blog")
            .add_header(add_auth_headers(&user).0, add_auth_headers(&user).1)
            .json(&json!({ "title": "Spam", "content": "Spam" }))
            .await
            .assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_drafts_are_hidden(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;

        let draft: BlogPostResponse = app
            .post("/api/blog")
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&json!({ "title": "Coming soon", "content": "Secret", "is_published": false }))
            .await
            .json();
        assert!(!draft.is_published);

        let posts: Vec<BlogPostResponse> = app.get("/api/blog").await.json();
        assert!(posts.is_empty());

        let response = app.get(&format!("/api/blog/{}", draft.id)).await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["detail"], "Blog post not found");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_paging_is_clamped(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;

        app.post("/api/blog")
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&json!({ "title": "Launch", "content": "We are open" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app.get("/api/blog?skip=-5&limit=-1").await;
        response.assert_status_ok();
        let posts: Vec<BlogPostResponse> = response.json();
        assert_eq!(posts.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_post_is_not_found(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;

        app.get(&format!("/api/blog/{}", Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }
}
