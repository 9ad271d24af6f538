//! HTTP handlers for purchase intake

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::ledger::NewPurchaseRequest;
use crate::middleware::CurrentUser;
use crate::services::purchasing::UpdatePurchaseStatusInput;
use crate::services::PurchasingService;
use crate::AppState;
use shared::{PaginatedResponse, Pagination, Purchase, PurchaseWithLines};

pub async fn list_purchases(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Purchase>>> {
    user.require("purchases", "view")?;
    let service = PurchasingService::new(state.db);
    let page = service.list_purchases(user.business_id, &pagination).await?;
    Ok(Json(page))
}

pub async fn get_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<PurchaseWithLines>> {
    user.require("purchases", "view")?;
    let service = PurchasingService::new(state.db);
    let purchase = service.get_purchase(user.business_id, purchase_id).await?;
    Ok(Json(purchase))
}

/// Record a purchase and receive every line into stock
pub async fn create_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewPurchaseRequest>,
) -> AppResult<(StatusCode, Json<PurchaseWithLines>)> {
    user.require("purchases", "create")?;
    let service = PurchasingService::new(state.db);
    let purchase = service.create_purchase(user.business_id, input).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// Payment and delivery status only; lines are immutable once received
pub async fn update_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(purchase_id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseStatusInput>,
) -> AppResult<Json<Purchase>> {
    user.require("purchases", "update")?;
    let service = PurchasingService::new(state.db);
    let purchase = service
        .update_status(user.business_id, purchase_id, input)
        .await?;
    Ok(Json(purchase))
}
