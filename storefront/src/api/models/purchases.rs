use crate::{
    db::models::purchases::PurchaseDBResponse,
    types::{ProductId, PurchaseId, UserId},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PurchaseId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub product_id: ProductId,
    pub product_name: String,
    /// Price paid at the time of purchase
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Returned after a successful purchase
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseReceipt {
    pub message: String,
    #[schema(value_type = String, format = "uuid")]
    pub purchase_id: PurchaseId,
    /// Wallet balance after the debit
    #[schema(value_type = f64)]
    pub wallet_balance: Decimal,
}

/// Query parameters for purchase history
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPurchasesQuery {
    /// Whose history to read; defaults to the caller. Other users require admin.
    #[param(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,

    /// Number of items to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    /// Maximum number of items to return
    #[param(default = 100, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,
}

impl From<PurchaseDBResponse> for PurchaseResponse {
    fn from(db: PurchaseDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            product_id: db.product_id,
            product_name: db.product_name,
            amount: db.amount,
            created_at: db.created_at,
        }
    }
}
