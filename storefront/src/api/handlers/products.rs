use crate::{
    api::models::{
        products::{ListProductsQuery, ProductCreate, ProductResponse, ProductUpdate},
        users::CurrentUser,
    },
    auth::permissions::{has_permission, operation, resource, RequiresPermission},
    db::{
        handlers::{products::ProductFilter, Products, Repository},
        models::products::{ProductCreateDBRequest, ProductUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Operation, Permission, ProductId, Resource},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use tracing::info;

fn validate_price(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Price must not be negative".to_string(),
        });
    }
    Ok(())
}

fn product_not_found(id: ProductId) -> Error {
    Error::NotFound {
        resource: "Product".to_string(),
        id: id.to_string(),
    }
}

// GET /products - Public catalog
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    summary = "List products",
    description = "List active products, newest first. Admins may pass include_inactive=true to see withdrawn products too.",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "List of products", body = [ProductResponse]),
        (status = 401, description = "include_inactive requested without a valid token"),
        (status = 403, description = "Forbidden - admin access required for include_inactive"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        (),
        ("BearerAuth" = [])
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
    current_user: Option<CurrentUser>,
) -> Result<Json<Vec<ProductResponse>>> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let mut filter = ProductFilter::new(skip, limit).with_category(query.category);
    if query.include_inactive.unwrap_or(false) {
        let user = current_user.ok_or(Error::Unauthenticated)?;
        if !has_permission(&user, Resource::Products, Operation::UpdateAll) {
            return Err(Error::InsufficientPermissions {
                required: Permission::Allow(Resource::Products, Operation::UpdateAll),
                action: Operation::ReadAll,
                resource: "inactive products".to_string(),
            });
        }
        filter = filter.include_inactive();
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut pool_conn);
    let products = repo.list(&filter).await?;

    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

// POST /products - Add to the catalog (admin only)
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    summary = "Create product",
    description = "Add a product to the catalog (admin only)",
    request_body = ProductCreate,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin access required"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Products, operation::CreateAll>,
    Json(data): Json<ProductCreate>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    if data.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Product name must not be empty".to_string(),
        });
    }
    validate_price(data.price)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut pool_conn);
    let product = repo.create(&ProductCreateDBRequest::from(data)).await?;

    info!("Product {} created by {}", product.id, current_user.id);
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

// GET /products/{product_id}
#[utoipa::path(
    get,
    path = "/products/{product_id}",
    tag = "products",
    summary = "Get product",
    description = "Get a single product by ID",
    params(
        ("product_id" = String, Path, description = "Product ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_product(State(state): State<AppState>, Path(product_id): Path<ProductId>) -> Result<Json<ProductResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut pool_conn);

    let product = repo.get_by_id(product_id).await?.ok_or_else(|| product_not_found(product_id))?;
    Ok(Json(ProductResponse::from(product)))
}

// PATCH /products/{product_id} - Partial update (admin only)
#[utoipa::path(
    patch,
    path = "/products/{product_id}",
    tag = "products",
    summary = "Update product",
    description = "Update product fields; set is_active to false to withdraw it from sale (admin only)",
    params(
        ("product_id" = String, Path, description = "Product ID (UUID)"),
    ),
    request_body = ProductUpdate,
    responses(
        (status = 200, description = "Updated product", body = ProductResponse),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin access required"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    _: RequiresPermission<resource::Products, operation::UpdateAll>,
    Json(data): Json<ProductUpdate>,
) -> Result<Json<ProductResponse>> {
    if let Some(price) = data.price {
        validate_price(price)?;
    }
    if data.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(Error::BadRequest {
            message: "Product name must not be empty".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Products::new(&mut pool_conn);

    let product = repo
        .update(product_id, &ProductUpdateDBRequest::from(data))
        .await?
        .ok_or_else(|| product_not_found(product_id))?;

    Ok(Json(ProductResponse::from(product)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use uuid::Uuid;

    fn product_payload(price: f64) -> Value {
        json!({
            "name": "Steam key",
            "description": "Redeemable on Steam",
            "price": price,
            "image_url": "https://cdn.example.com/steam.png",
            "category": "games"
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_can_create_product(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;

        let response = app
            .post("/api/products")
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&product_payload(25.0))
            .await;

        response.assert_status(StatusCode::CREATED);
        let product: ProductResponse = response.json();
        assert_eq!(product.name, "Steam key");
        assert_eq!(product.price, Decimal::from(25));
        assert!(product.is_active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_customer_cannot_create_product(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;

        let response = app
            .post("/api/products")
            .add_header(add_auth_headers(&user).0, add_auth_headers(&user).1)
            .json(&product_payload(25.0))
            .await;

        response.assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_product_requires_auth(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;

        app.post("/api/products")
            .json(&product_payload(25.0))
            .await
            .assert_status_unauthorized();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_price_is_bad_request(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;

        let response = app
            .post("/api/products")
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&product_payload(-5.0))
            .await;

        response.assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_products_is_public_and_hides_inactive(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let visible = create_test_product(&pool, Decimal::from(10)).await;
        let hidden = create_test_product(&pool, Decimal::from(20)).await;

        app.patch(&format!("/api/products/{}", hidden.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&json!({ "is_active": false }))
            .await
            .assert_status_ok();

        let response = app.get("/api/products").await;
        response.assert_status_ok();
        let products: Vec<ProductResponse> = response.json();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, visible.id);

        // Detail still resolves for inactive products
        let response = app.get(&format!("/api/products/{}", hidden.id)).await;
        response.assert_status_ok();
        let product: ProductResponse = response.json();
        assert!(!product.is_active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_products_by_category(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        create_test_product(&pool, Decimal::from(10)).await;

        let games: Vec<ProductResponse> = app.get("/api/products?category=games").await.json();
        assert_eq!(games.len(), 1);

        let other: Vec<ProductResponse> = app.get("/api/products?category=gift_cards").await.json();
        assert!(other.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_can_list_inactive_products(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let user = create_test_user(&pool).await;
        create_test_product(&pool, Decimal::from(10)).await;
        let withdrawn = create_test_product(&pool, Decimal::from(20)).await;

        app.patch(&format!("/api/products/{}", withdrawn.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&json!({ "is_active": false }))
            .await
            .assert_status_ok();

        let all: Vec<ProductResponse> = app
            .get("/api/products?include_inactive=true")
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .await
            .json();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|p| p.id == withdrawn.id && !p.is_active));

        app.get("/api/products?include_inactive=true")
            .add_header(add_auth_headers(&user).0, add_auth_headers(&user).1)
            .await
            .assert_status_forbidden();

        app.get("/api/products?include_inactive=true").await.assert_status_unauthorized();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_paging_is_clamped(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        create_test_product(&pool, Decimal::from(10)).await;

        let response = app.get("/api/products?limit=-1").await;
        response.assert_status_ok();
        let products: Vec<ProductResponse> = response.json();
        assert_eq!(products.len(), 1);

        let response = app.get("/api/products?skip=-5").await;
        response.assert_status_ok();
        let products: Vec<ProductResponse> = response.json();
        assert_eq!(products.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_unknown_product_is_not_found(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;

        let response = app.get(&format!("/api/products/{}", Uuid::new_v4())).await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["detail"], "Product not found");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_product_partial(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_admin_user(&pool).await;
        let product = create_test_product(&pool, Decimal::from(10)).await;

        let response = app
            .patch(&format!("/api/products/{}", product.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&json!({ "price": 12.5 }))
            .await;

        response.assert_status_ok();
        let updated: ProductResponse = response.json();
        assert_eq!(updated.price, Decimal::new(125, 1));
        assert_eq!(updated.name, product.name);

        app.patch(&format!("/api/products/{}", Uuid::new_v4()))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&json!({ "price": 1 }))
            .await
            .assert_status_not_found();
    }
}
