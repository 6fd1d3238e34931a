use crate::{
    api::models::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        users::UserResponse,
    },
    auth::{password, session},
    db::{
        errors::DbError,
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::{Error, Result},
    AppState,
};
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{info, warn};

fn email_taken() -> Error {
    Error::BadRequest {
        message: "Email already registered".to_string(),
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    summary = "Register",
    description = "Create an account and return a session token for it",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Email already registered or invalid input"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<(StatusCode, Json<AuthResponse>)> {
    let email = request.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::BadRequest {
            message: "Invalid email address".to_string(),
        });
    }
    if request.username.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Username must not be empty".to_string(),
        });
    }
    password::validate_password(&request.password, &state.config.auth.password)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    if repo.get_user_by_email(&email).await?.is_some() {
        return Err(email_taken());
    }

    let is_admin = request.is_admin && state.config.auth.allow_admin_registration;
    if request.is_admin && !is_admin {
        warn!("Ignoring is_admin on registration for {email}: admin registration is disabled");
    }

    let user_create = UserCreateDBRequest {
        email,
        username: request.username.trim().to_string(),
        password_hash: password::hash_string(&request.password)?,
        is_admin,
    };

    // A concurrent registration can still win the race to the unique constraint
    let user = match repo.create(&user_create).await {
        Ok(user) => user,
        Err(DbError::UniqueViolation { .. }) => return Err(email_taken()),
        Err(e) => return Err(e.into()),
    };

    let token = session::create_session_token(user.id, &user.email, user.is_admin, &state.config)?;
    info!("Registered user {} (admin: {})", user.id, user.is_admin);

    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, UserResponse::from(user)))))
}

/// Exchange email and password for a session token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    summary = "Login",
    description = "Verify credentials and return a session token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Incorrect email or password"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<AuthResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let user = repo
        .get_user_by_email(request.email.trim())
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !password::verify_string(&request.password, &user.password_hash)? {
        return Err(Error::InvalidCredentials);
    }

    let token = session::create_session_token(user.id, &user.email, user.is_admin, &state.config)?;
    Ok(Json(AuthResponse::bearer(token, UserResponse::from(user))))
}
