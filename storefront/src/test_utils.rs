use crate::{
    api::models::users::UserResponse,
    auth::{password, session},
    config::Config,
    db::{
        handlers::{Products, Repository, Users},
        models::{
            products::{ProductCreateDBRequest, ProductDBResponse},
            users::UserCreateDBRequest,
        },
    },
    types::UserId,
};

use axum_test::TestServer;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Password given to every user made by `create_test_user` / `create_test_admin_user`
pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    let router = crate::setup_app(pool, config).await.expect("Failed to setup test app");
    TestServer::new(router).expect("Failed to create test server")
}

pub fn create_test_config() -> Config {
    let database_url = std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "postgres://postgres@localhost/test".to_string());

    Config {
        database_url,
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        enable_metrics: false,
        ..Default::default()
    }
}

async fn insert_user(pool: &PgPool, prefix: &str, is_admin: bool) -> UserResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let user_id = Uuid::new_v4();
    let username = format!("{prefix}_{}", user_id.simple());
    let email = format!("{username}@example.com");

    let user_create = UserCreateDBRequest {
        email,
        username,
        password_hash: password::hash_string(TEST_PASSWORD).expect("Failed to hash test password"),
        is_admin,
    };

    let user = users_repo.create(&user_create).await.expect("Failed to create test user");
    UserResponse::from(user)
}

pub async fn create_test_user(pool: &PgPool) -> UserResponse {
    insert_user(pool, "testuser", false).await
}

pub async fn create_test_admin_user(pool: &PgPool) -> UserResponse {
    insert_user(pool, "testadmin", true).await
}

/// Header name and value carrying a valid session token for `user`
pub fn add_auth_headers(user: &UserResponse) -> (String, String) {
    let token = session::create_session_token(user.id, &user.email, user.is_admin, &create_test_config())
        .expect("Failed to create test session token");
    ("authorization".to_string(), format!("Bearer {token}"))
}

pub async fn create_test_product(pool: &PgPool, price: Decimal) -> ProductDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut products_repo = Products::new(&mut conn);
    let name = format!("product_{}", Uuid::new_v4().simple());

    products_repo
        .create(&ProductCreateDBRequest {
            name: name.clone(),
            description: format!("{name} description"),
            price,
            image_url: "https://cdn.example.com/product.png".to_string(),
            category: "games".to_string(),
        })
        .await
        .expect("Failed to create test product")
}

/// Put money straight into a wallet, bypassing the top-up review flow
pub async fn fund_wallet(pool: &PgPool, user_id: UserId, amount: Decimal) -> Decimal {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .credit_wallet(user_id, amount)
        .await
        .expect("Failed to fund wallet")
}

pub async fn get_wallet_balance(pool: &PgPool, user_id: UserId) -> Decimal {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .get_by_id(user_id)
        .await
        .expect("Failed to load user")
        .expect("User missing")
        .wallet_balance
}
