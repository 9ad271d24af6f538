//! HTTP handlers for catering orders

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::ledger::{NewOrderRequest, UpdateOrderRequest};
use crate::middleware::CurrentUser;
use crate::services::orders::OrderFilter;
use crate::services::OrderService;
use crate::AppState;
use shared::{Order, OrderWithLines, PaginatedResponse};

/// Orders by event date, optionally filtered by status
pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    user.require("orders", "view")?;
    let service = OrderService::new(state.db);
    let orders = service.list_orders(user.business_id, &filter).await?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithLines>> {
    user.require("orders", "view")?;
    let service = OrderService::new(state.db);
    let order = service.get_order(user.business_id, order_id).await?;
    Ok(Json(order))
}

pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderWithLines>)> {
    user.require("orders", "create")?;
    let service = OrderService::new(state.db);
    let order = service.create_order(user.business_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Status and advance changes, settled in one transaction
pub async fn update_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderRequest>,
) -> AppResult<Json<Order>> {
    user.require("orders", "update")?;
    let service = OrderService::new(state.db);
    let order = service.update_order(user.business_id, order_id, input).await?;
    Ok(Json(order))
}
