use crate::{
    db::models::topups::{TopUpDBResponse, TopUpStatus},
    types::{TopUpRequestId, UserId},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopUpCreate {
    /// Amount to credit once approved, must be positive
    #[schema(value_type = f64)]
    pub amount: Decimal,
    /// Base64-encoded payment receipt image, optionally as a `data:` URL
    pub receipt_data: String,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopUpResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TopUpRequestId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub receipt_data: String,
    pub status: TopUpStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopUpSubmitted {
    pub message: String,
    #[schema(value_type = String, format = "uuid")]
    pub request_id: TopUpRequestId,
}

/// Query parameters for approving or rejecting a request
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProcessTopUpQuery {
    /// Free-form note stored on the request
    pub admin_notes: Option<String>,
}

/// Query parameters for listing top-up requests
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListTopUpsQuery {
    /// Only return requests in this state
    pub status: Option<TopUpStatus>,

    /// Number of items to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    /// Maximum number of items to return
    #[param(default = 100, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,
}

impl From<TopUpDBResponse> for TopUpResponse {
    fn from(db: TopUpDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            amount: db.amount,
            receipt_data: db.receipt_data,
            status: db.status,
            admin_notes: db.admin_notes,
            created_at: db.created_at,
            processed_at: db.processed_at,
        }
    }
}
