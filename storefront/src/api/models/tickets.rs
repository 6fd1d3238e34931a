use crate::{
    db::models::tickets::{TicketDBResponse, TicketReply, TicketStatus},
    types::{TicketId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketCreate {
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TicketId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub responses: Vec<TicketReply>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing tickets
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListTicketsQuery {
    /// Number of items to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    /// Maximum number of items to return
    #[param(default = 100, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,
}

impl From<TicketDBResponse> for TicketResponse {
    fn from(db: TicketDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            subject: db.subject,
            message: db.message,
            status: db.status,
            responses: db.responses.0,
            created_at: db.created_at,
        }
    }
}
