use crate::types::{TopUpRequestId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Top-up review state stored as TEXT in database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TopUpStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct TopUpCreateDBRequest {
    pub user_id: UserId,
    pub amount: Decimal,
    pub receipt_data: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct TopUpDBResponse {
    pub id: TopUpRequestId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub receipt_data: String,
    pub status: TopUpStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}
