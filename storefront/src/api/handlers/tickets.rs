use crate::{
    api::models::tickets::{ListTicketsQuery, TicketCreate, TicketResponse},
    auth::permissions::{operation, resource, RequiresPermission},
    db::{
        handlers::{tickets::TicketFilter, Repository, Tickets},
        models::tickets::TicketCreateDBRequest,
    },
    errors::{Error, Result},
    AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};

// POST /tickets - Open a support ticket
#[utoipa::path(
    post,
    path = "/tickets",
    tag = "tickets",
    summary = "Create ticket",
    description = "Open a support ticket",
    request_body = TicketCreate,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Subject or message missing"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Tickets, operation::CreateOwn>,
    Json(data): Json<TicketCreate>,
) -> Result<(StatusCode, Json<TicketResponse>)> {
    if data.subject.trim().is_empty() || data.message.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Subject and message are required".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let ticket = Tickets::new(&mut pool_conn)
        .create(&TicketCreateDBRequest {
            user_id: current_user.id,
            subject: data.subject,
            message: data.message,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket))))
}

// GET /tickets - Caller's tickets
#[utoipa::path(
    get,
    path = "/tickets",
    tag = "tickets",
    summary = "List my tickets",
    description = "List the caller's support tickets, newest first",
    params(ListTicketsQuery),
    responses(
        (status = 200, description = "Tickets", body = [TicketResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn list_my_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
    current_user: RequiresPermission<resource::Tickets, operation::ReadOwn>,
) -> Result<Json<Vec<TicketResponse>>> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let tickets = Tickets::new(&mut pool_conn)
        .list(&TicketFilter::new(skip, limit).for_user(current_user.id))
        .await?;

    Ok(Json(tickets.into_iter().map(TicketResponse::from).collect()))
}

// GET /admin/tickets - Every ticket (admin only)
#[utoipa::path(
    get,
    path = "/admin/tickets",
    tag = "tickets",
    summary = "List all tickets",
    description = "List every user's support tickets (admin only)",
    params(ListTicketsQuery),
    responses(
        (status = 200, description = "Tickets", body = [TicketResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin access required"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn list_all_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
    _: RequiresPermission<resource::Tickets, operation::ReadAll>,
) -> Result<Json<Vec<TicketResponse>>> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let tickets = Tickets::new(&mut pool_conn).list(&TicketFilter::new(skip, limit)).await?;

    Ok(Json(tickets.into_iter().map(TicketResponse::from).collect()))
}
