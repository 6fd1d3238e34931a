mod api;
mod auth;
mod config;
mod db;
mod errors;
mod openapi;
mod types;

#[cfg(test)]
mod test_utils;

use crate::{auth::password, db::handlers::Users, openapi::ApiDoc};
use axum::{
    http::{HeaderValue, Request, Response},
    routing::{get, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use clap::Parser;
use config::{Args, Config};
use sqlx::PgPool;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, instrument, Span};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub use types::UserId;

#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Ensure the configured admin account exists, promoting and re-keying it if the email is taken
pub async fn create_initial_admin_user(email: &str, password: &str, db: &PgPool) -> anyhow::Result<UserId> {
    let password_hash = password::hash_string(password).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    // Display name is the local part of the address
    let username = email.split('@').next().filter(|name| !name.is_empty()).unwrap_or(email);

    let mut conn = db.acquire().await?;
    let admin = Users::new(&mut conn)
        .upsert_admin(email, username, &password_hash)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin user: {e}"))?;

    Ok(admin.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    use crate::config::CorsOrigin;
    use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin};

    let cors_config = &config.security.cors;

    let allow_origin = if cors_config.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    // Wildcard methods and headers are rejected alongside credentials, mirror the request instead
    let mut cors = if cors_config.allow_credentials {
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(AllowMethods::any())
            .allow_headers(AllowHeaders::any())
    };

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

pub async fn setup_app(pool: PgPool, config: Config) -> anyhow::Result<Router> {
    debug!("Setting up application");
    sqlx::migrate!("./migrations").run(&pool).await?;

    if let Some(admin_password) = config.admin_password.as_deref() {
        let admin_id = create_initial_admin_user(&config.admin_email, admin_password, &pool).await?;
        info!("Admin account {} ready ({})", config.admin_email, admin_id);
    }

    let state = AppState::builder().db(pool).config(config).build();
    build_router(&state)
}

#[instrument(skip(state))]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{auth, blog, products, purchases, tickets, topups, users};

    let api_routes = Router::new()
        // Accounts
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(users::get_current_user))
        .route("/admin/users", get(users::list_users))
        // Catalog
        .route("/products", get(products::list_products).post(products::create_product))
        .route(
            "/products/{product_id}",
            get(products::get_product).patch(products::update_product),
        )
        // Wallet top-ups
        .route("/topup", post(topups::submit_topup))
        .route("/topup-requests", get(topups::list_my_topups))
        .route("/admin/topup-requests", get(topups::list_all_topups))
        .route("/admin/topup-requests/{request_id}/approve", post(topups::approve_topup))
        .route("/admin/topup-requests/{request_id}/reject", post(topups::reject_topup))
        // Purchases
        .route("/purchase/{product_id}", post(purchases::purchase_product))
        .route("/purchases", get(purchases::list_purchases))
        // Support
        .route("/tickets", get(tickets::list_my_tickets).post(tickets::create_ticket))
        .route("/admin/tickets", get(tickets::list_all_tickets))
        // Blog
        .route("/blog", get(blog::list_blog_posts).post(blog::create_blog_post))
        .route("/blog/{post_id}", get(blog::get_blog_post))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/api/docs"));

    let cors_layer = create_cors_layer(&state.config)?;
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &Span| {
            tracing::info!(
                status = %response.status(),
                latency = ?latency,
                "request completed"
            );
        });

    let mut router = router.layer(ServiceBuilder::new().layer(trace_layer).layer(cors_layer));

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    Ok(router)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    debug!("{:?}", args);

    let config = Config::load(&args)?;
    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    let pool = PgPool::connect(&config.database_url).await?;
    let router = setup_app(pool, config.clone()).await?;

    let bind_addr = config.bind_address();
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Storefront listening on http://{}", bind_addr);

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[cfg(test)]
mod test {
    use super::{create_initial_admin_user, AppState};
    use crate::{
        auth::password,
        db::handlers::Users,
        test_utils::{create_test_app, create_test_app_with_config, create_test_config, create_test_user},
    };
    use serde_json::{json, Value};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_create_initial_admin_user_new_user(pool: PgPool) {
        let test_email = "new-admin@example.com";

        let user_id = create_initial_admin_user(test_email, "bootstrap-pass", &pool)
            .await
            .expect("Should create admin user successfully");

        let mut conn = pool.acquire().await.unwrap();
        let created_user = Users::new(&mut conn)
            .get_user_by_email(test_email)
            .await
            .expect("Should be able to query user")
            .expect("User should exist");

        assert_eq!(created_user.id, user_id);
        assert_eq!(created_user.username, "new-admin");
        assert!(created_user.is_admin);
        assert!(password::verify_string("bootstrap-pass", &created_user.password_hash).unwrap());
    }

    #[sqlx::test]
    async fn test_create_initial_admin_user_existing_user(pool: PgPool) {
        let existing_user = create_test_user(&pool).await;
        assert!(!existing_user.is_admin);

        let returned_user_id = create_initial_admin_user(&existing_user.email, "rotated-pass", &pool)
            .await
            .expect("Should handle existing user successfully");
        assert_eq!(returned_user_id, existing_user.id);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn)
            .get_user_by_email(&existing_user.email)
            .await
            .expect("Should be able to query user")
            .expect("User should still exist");

        assert!(user.is_admin);
        assert!(password::verify_string("rotated-pass", &user.password_hash).unwrap());
    }

    #[sqlx::test]
    async fn test_setup_app_bootstraps_admin_login(pool: PgPool) {
        let mut config = create_test_config();
        config.admin_password = Some("bootstrap-pass".to_string());

        let server = create_test_app_with_config(pool, config).await;
        let response = server
            .post("/api/login")
            .json(&json!({ "email": "admin@test.com", "password": "bootstrap-pass" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["is_admin"], true);
    }

    #[sqlx::test]
    async fn test_setup_app_integration(pool: PgPool) {
        let server = create_test_app(pool).await;

        let health_response = server.get("/healthz").await;
        assert_eq!(health_response.status_code().as_u16(), 200);
        assert_eq!(health_response.text(), "OK");

        // Protected routes reject anonymous callers
        let api_response = server.get("/api/admin/users").await;
        assert_eq!(api_response.status_code().as_u16(), 401);
    }

    #[sqlx::test]
    async fn test_openapi_document_is_served(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();

        let document: Value = response.json();
        assert!(document["paths"]["/purchase/{product_id}"]["post"].is_object());
        assert!(document["components"]["securitySchemes"]["BearerAuth"].is_object());
    }

    #[sqlx::test]
    async fn test_build_router_with_metrics_disabled(pool: PgPool) {
        let mut config = create_test_config();
        config.enable_metrics = false;

        let app_state = AppState::builder().db(pool).config(config).build();
        let router = super::build_router(&app_state).expect("Failed to build router");
        let server = axum_test::TestServer::new(router).expect("Failed to create test server");

        let metrics_response = server.get("/internal/metrics").await;
        assert_eq!(metrics_response.status_code().as_u16(), 404);
    }

    #[sqlx::test]
    async fn test_build_router_with_metrics_enabled(pool: PgPool) {
        let mut config = create_test_config();
        config.enable_metrics = true;

        let app_state = AppState::builder().db(pool).config(config).build();
        let router = super::build_router(&app_state).expect("Failed to build router");
        let server = axum_test::TestServer::new(router).expect("Failed to create test server");

        // Generate some traffic so there is something to render
        server.get("/healthz").await;

        let metrics_response = server.get("/internal/metrics").await;
        assert_eq!(metrics_response.status_code().as_u16(), 200);
        assert!(metrics_response.text().contains("# TYPE"));
    }
}
