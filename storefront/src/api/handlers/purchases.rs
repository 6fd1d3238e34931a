use crate::{
    api::models::{
        purchases::{ListPurchasesQuery, PurchaseReceipt, PurchaseResponse},
        users::CurrentUser,
    },
    auth::permissions::{can_read_all_resources, can_read_own_resource, operation, resource, RequiresPermission},
    db::{
        handlers::{purchases::PurchaseFilter, Products, Purchases, Repository, Users},
        models::purchases::PurchaseCreateDBRequest,
    },
    errors::{Error, Result},
    types::{Operation, Permission, ProductId, Resource},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

// POST /purchase/{product_id} - Buy with wallet balance
#[utoipa::path(
    post,
    path = "/purchase/{product_id}",
    tag = "purchases",
    summary = "Purchase product",
    description = "Buy a product, debiting its price from the caller's wallet",
    params(
        ("product_id" = String, Path, description = "Product ID (UUID)"),
    ),
    responses(
        (status = 201, description = "Purchase successful", body = PurchaseReceipt),
        (status = 400, description = "Product not available or insufficient wallet balance"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn purchase_product(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    current_user: RequiresPermission<resource::Purchases, operation::CreateOwn>,
) -> Result<(StatusCode, Json<PurchaseReceipt>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let product = Products::new(&mut pool_conn)
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Product".to_string(),
            id: product_id.to_string(),
        })?;

    if !product.is_active {
        return Err(Error::BadRequest {
            message: "Product is not available".to_string(),
        });
    }

    // Conditional debit: nothing is written unless the balance covers the price
    let balance = Users::new(&mut pool_conn)
        .debit_wallet(current_user.id, product.price)
        .await?
        .ok_or_else(|| Error::BadRequest {
            message: "Insufficient wallet balance".to_string(),
        })?;

    let request = PurchaseCreateDBRequest {
        user_id: current_user.id,
        product_id: product.id,
        product_name: product.name.clone(),
        amount: product.price,
    };
    let purchase = match Purchases::new(&mut pool_conn).create(&request).await {
        Ok(purchase) => purchase,
        Err(e) => {
            // Refund the debit, the purchase row was never written
            error!("Failed to record purchase of {} by {}: {e}", product.id, current_user.id);
            Users::new(&mut pool_conn).credit_wallet(current_user.id, product.price).await?;
            return Err(e.into());
        }
    };

    info!(
        "User {} bought {} for {}, balance now {}",
        current_user.id, product.id, product.price, balance
    );
    Ok((
        StatusCode::CREATED,
        Json(PurchaseReceipt {
            message: "Purchase successful".to_string(),
            purchase_id: purchase.id,
            wallet_balance: balance,
        }),
    ))
}

// GET /purchases - Purchase history
#[utoipa::path(
    get,
    path = "/purchases",
    tag = "purchases",
    summary = "List purchases",
    description = "List the caller's purchases, newest first. Admins may pass user_id to read another user's history.",
    params(ListPurchasesQuery),
    responses(
        (status = 200, description = "Purchase history", body = [PurchaseResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - can only view own purchases unless admin"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("BearerAuth" = [])
    )
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(query): Query<ListPurchasesQuery>,
    // Can't use RequiresPermission here because we need conditional logic for own vs other users
    current_user: CurrentUser,
) -> Result<Json<Vec<PurchaseResponse>>> {
    let target_user_id = query.user_id.unwrap_or(current_user.id);

    let can_read_all = can_read_all_resources(&current_user, Resource::Purchases);
    let can_read_own = can_read_own_resource(&current_user, Resource::Purchases, target_user_id);
    if !can_read_all && !can_read_own {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Purchases, Operation::ReadAll),
                Permission::Allow(Resource::Purchases, Operation::ReadOwn),
            ]),
            action: Operation::ReadAll,
            resource: format!("purchases for user {target_user_id}"),
        });
    }

    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let purchases = Purchases::new(&mut pool_conn)
        .list(&PurchaseFilter::new(skip, limit).for_user(target_user_id))
        .await?;

    Ok(Json(purchases.into_iter().map(PurchaseResponse::from).collect()))
}
