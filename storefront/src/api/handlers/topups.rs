use crate::{
    api::models::{
        topups::{ListTopUpsQuery, ProcessTopUpQuery, TopUpCreate, TopUpResponse, TopUpSubmitted},
        MessageResponse,
    },
    auth::permissions::{operation, resource, RequiresPermission},
    db::{
        handlers::{topups::TopUpFilter, Repository, TopUps, Users},
        models::topups::{TopUpCreateDBRequest, TopUpDBResponse, TopUpStatus},
    },
    errors::{Error, Result},
    types::TopUpRequestId,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::info;

/// Check that a receipt is base64 image data, optionally wrapped as a `data:<mime>;base64,` URL
fn validate_receipt(receipt: &str) -> Result<()> {
    let invalid = || Error::BadRequest {
        message: "receipt_data must be base64-encoded".to_string(),
    };

    let receipt = receipt.trim();
    let payload = match receipt.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").map(|(_, data)| data).ok_or_else(invalid)?,
        None => receipt,
    };

    if payload.is_empty() {
        return Err(invalid());
    }
    STANDARD.decode(payload).map_err(|_| invalid())?;
    Ok(())
}

fn already_processed() -> Error {
    Error::BadRequest {
        message: "Request already processed".to_string(),
    }
}

// POST /topup - Ask for wallet credit
#[utoipa::path(
    post,
    path = "/topup",
    tag = "topups",
    summary = "Submit top-up request",
    description = "Submit a wallet top-up with a payment receipt; credited once an admin approves it",
    request_body = TopUpCreate,
    responses(
        (status = 201, description = "Request submitted", body = TopUpSubmitted),
        (status = 400, description = "Invalid amount or receipt"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn submit_topup(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::TopUps, operation::CreateOwn>,
    Json(data): Json<TopUpCreate>,
) -> Result<(StatusCode, Json<TopUpSubmitted>)> {
    if data.amount <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Amount must be greater than zero".to_string(),
        });
    }
    validate_receipt(&data.receipt_data)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = TopUps::new(&mut pool_conn);

    let topup = repo
        .create(&TopUpCreateDBRequest {
            user_id: current_user.id,
            amount: data.amount,
            receipt_data: data.receipt_data,
        })
        .await?;

    info!("Top-up request {} for {} submitted by {}", topup.id, topup.amount, current_user.id);
    Ok((
        StatusCode::CREATED,
        Json(TopUpSubmitted {
            message: "Top-up request submitted successfully".to_string(),
            request_id: topup.id,
        }),
    ))
}

// GET /topup-requests - Caller's own requests
#[utoipa::path(
    get,
    path = "/topup-requests",
    tag = "topups",
    summary = "List my top-up requests",
    description = "List the caller's top-up requests, newest first",
    params(ListTopUpsQuery),
    responses(
        (status = 200, description = "Top-up requests", body = [TopUpResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn list_my_topups(
    State(state): State<AppState>,
    Query(query): Query<ListTopUpsQuery>,
    current_user: RequiresPermission<resource::TopUps, operation::ReadOwn>,
) -> Result<Json<Vec<TopUpResponse>>> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let filter = TopUpFilter::new(skip, limit).for_user(current_user.id).with_status(query.status);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let topups = TopUps::new(&mut pool_conn).list(&filter).await?;

    Ok(Json(topups.into_iter().map(TopUpResponse::from).collect()))
}

// GET /admin/topup-requests - Review queue (admin only)
#[utoipa::path(
    get,
    path = "/admin/topup-requests",
    tag = "topups",
    summary = "List all top-up requests",
    description = "List every user's top-up requests, optionally filtered by status (admin only)",
    params(ListTopUpsQuery),
    responses(
        (status = 200, description = "Top-up requests", body = [TopUpResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin access required"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn list_all_topups(
    State(state): State<AppState>,
    Query(query): Query<ListTopUpsQuery>,
    _: RequiresPermission<resource::TopUps, operation::ReadAll>,
) -> Result<Json<Vec<TopUpResponse>>> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let filter = TopUpFilter::new(skip, limit).with_status(query.status);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let topups = TopUps::new(&mut pool_conn).list(&filter).await?;

    Ok(Json(topups.into_iter().map(TopUpResponse::from).collect()))
}

// POST /admin/topup-requests/{request_id}/approve
#[utoipa::path(
    post,
    path = "/admin/topup-requests/{request_id}/approve",
    tag = "topups",
    summary = "Approve top-up",
    description = "Approve a pending top-up and credit the amount to the owner's wallet (admin only)",
    params(
        ("request_id" = String, Path, description = "Top-up request ID (UUID)"),
        ProcessTopUpQuery,
    ),
    responses(
        (status = 200, description = "Approved", body = MessageResponse),
        (status = 400, description = "Request already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin access required"),
        (status = 404, description = "Request not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn approve_topup(
    State(state): State<AppState>,
    Path(request_id): Path<TopUpRequestId>,
    Query(query): Query<ProcessTopUpQuery>,
    current_user: RequiresPermission<resource::TopUps, operation::UpdateAll>,
) -> Result<Json<MessageResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let topup = process_topup(&mut pool_conn, request_id, TopUpStatus::Approved, query.admin_notes).await?;

    // Status is claimed first; the credit is a second, independent write
    let balance = Users::new(&mut pool_conn).credit_wallet(topup.user_id, topup.amount).await?;

    info!(
        "Top-up {} approved by {}: credited {} to {}, balance now {}",
        topup.id, current_user.id, topup.amount, topup.user_id, balance
    );
    Ok(Json(MessageResponse::new("Top-up approved successfully")))
}

// POST /admin/topup-requests/{request_id}/reject
#[utoipa::path(
    post,
    path = "/admin/topup-requests/{request_id}/reject",
    tag = "topups",
    summary = "Reject top-up",
    description = "Reject a pending top-up; the wallet is not touched (admin only)",
    params(
        ("request_id" = String, Path, description = "Top-up request ID (UUID)"),
        ProcessTopUpQuery,
    ),
    responses(
        (status = 200, description = "Rejected", body = MessageResponse),
        (status = 400, description = "Request already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin access required"),
        (status = 404, description = "Request not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn reject_topup(
    State(state): State<AppState>,
    Path(request_id): Path<TopUpRequestId>,
    Query(query): Query<ProcessTopUpQuery>,
    current_user: RequiresPermission<resource::TopUps, operation::UpdateAll>,
) -> Result<Json<MessageResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let notes = query.admin_notes.unwrap_or_default();
    let topup = process_topup(&mut pool_conn, request_id, TopUpStatus::Rejected, Some(notes)).await?;

    info!("Top-up {} rejected by {}", topup.id, current_user.id);
    Ok(Json(MessageResponse::new("Top-up rejected")))
}

/// Shared guard for approve/reject: the request must exist and still be pending
async fn process_topup(
    conn: &mut PgConnection,
    request_id: TopUpRequestId,
    status: TopUpStatus,
    admin_notes: Option<String>,
) -> Result<TopUpDBResponse> {
    let mut repo = TopUps::new(conn);

    let existing = repo.get_by_id(request_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Request".to_string(),
        id: request_id.to_string(),
    })?;
    if existing.status != TopUpStatus::Pending {
        return Err(already_processed());
    }

    // Lost a race with another reviewer
    repo.mark_processed(request_id, status, admin_notes.as_deref())
        .await?
        .ok_or_else(already_processed)
}
