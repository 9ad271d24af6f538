//! HTTP handlers for inventory and stock ledger endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::ledger::{AdjustStockRequest, CreateItemRequest};
use crate::middleware::CurrentUser;
use crate::services::inventory::UpdateItemInput;
use crate::services::InventoryService;
use crate::AppState;
use shared::{InventoryItem, LowStockItem, StockMovement};

/// List active inventory items
pub async fn list_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<InventoryItem>>> {
    user.require("inventory", "view")?;
    let service = InventoryService::new(state.db);
    let items = service.list_items(user.business_id).await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    user.require("inventory", "view")?;
    let service = InventoryService::new(state.db);
    let item = service.get_item(user.business_id, item_id).await?;
    Ok(Json(item))
}

/// Create an item, recording an opening movement when it starts with stock
pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<InventoryItem>)> {
    user.require("inventory", "create")?;
    let service = InventoryService::new(state.db);
    let item = service.create_item(user.business_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<InventoryItem>> {
    user.require("inventory", "update")?;
    let service = InventoryService::new(state.db);
    let item = service.update_item(user.business_id, item_id, input).await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require("inventory", "delete")?;
    let service = InventoryService::new(state.db);
    service.delete_item(user.business_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Manual stock change through the ledger
pub async fn adjust_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<AdjustStockRequest>,
) -> AppResult<Json<InventoryItem>> {
    user.require("inventory", "update")?;
    let service = InventoryService::new(state.db);
    let item = service.adjust_stock(user.business_id, item_id, input).await?;
    Ok(Json(item))
}

/// Items at or below their minimum, most depleted first
pub async fn low_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<LowStockItem>>> {
    user.require("inventory", "view")?;
    let service = InventoryService::new(state.db);
    let report = service.low_stock(user.business_id).await?;
    Ok(Json(report))
}

pub async fn list_movements(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockMovement>>> {
    user.require("inventory", "view")?;
    let service = InventoryService::new(state.db);
    let movements = service.movements(user.business_id, item_id).await?;
    Ok(Json(movements))
}
