//! HTTP handlers for the menu catalogue

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::ledger::{NewMenuItemRequest, UpdateMenuItemRequest};
use crate::middleware::CurrentUser;
use crate::services::MenuService;
use crate::AppState;
use shared::{MenuItem, MenuItemWithIngredients};

pub async fn list_menu_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<MenuItem>>> {
    user.require("menu", "view")?;
    let service = MenuService::new(state.db);
    let items = service.list_items(user.business_id).await?;
    Ok(Json(items))
}

pub async fn get_menu_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(menu_item_id): Path<Uuid>,
) -> AppResult<Json<MenuItemWithIngredients>> {
    user.require("menu", "view")?;
    let service = MenuService::new(state.db);
    let item = service.get_item(user.business_id, menu_item_id).await?;
    Ok(Json(item))
}

pub async fn create_menu_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NewMenuItemRequest>,
) -> AppResult<(StatusCode, Json<MenuItemWithIngredients>)> {
    user.require("menu", "create")?;
    let service = MenuService::new(state.db);
    let item = service.create_item(user.business_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_menu_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(menu_item_id): Path<Uuid>,
    Json(input): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<MenuItemWithIngredients>> {
    user.require("menu", "update")?;
    let service = MenuService::new(state.db);
    let item = service
        .update_item(user.business_id, menu_item_id, input)
        .await?;
    Ok(Json(item))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(menu_item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require("menu", "delete")?;
    let service = MenuService::new(state.db);
    service.delete_item(user.business_id, menu_item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
