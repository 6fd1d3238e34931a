use crate::types::{TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;

/// Ticket state stored as TEXT in database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

/// A staff reply stored inside the ticket's JSONB `responses` column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TicketReply {
    pub author: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TicketCreateDBRequest {
    pub user_id: UserId,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct TicketDBResponse {
    pub id: TicketId,
    pub user_id: UserId,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub responses: Json<Vec<TicketReply>>,
    pub created_at: DateTime<Utc>,
}
