use crate::types::{ProductId, PurchaseId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct PurchaseCreateDBRequest {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct PurchaseDBResponse {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}
