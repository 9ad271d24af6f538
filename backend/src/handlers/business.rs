//! Business profile, supplier directory and search handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::business::{CreateSupplierInput, SearchResults, UpdateProfileInput};
use crate::services::BusinessService;
use crate::AppState;
use shared::{Business, Supplier};

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Business>> {
    let service = BusinessService::new(state.db);
    let business = service.get_profile(user.business_id).await?;
    Ok(Json(business))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<Json<Business>> {
    user.require("business", "update")?;
    let service = BusinessService::new(state.db);
    let business = service.update_profile(user.business_id, input).await?;
    Ok(Json(business))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Supplier>>> {
    user.require("purchases", "view")?;
    let service = BusinessService::new(state.db);
    let suppliers = service.list_suppliers(user.business_id).await?;
    Ok(Json(suppliers))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    user.require("purchases", "create")?;
    let service = BusinessService::new(state.db);
    let supplier = service.create_supplier(user.business_id, input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require("purchases", "delete")?;
    let service = BusinessService::new(state.db);
    service.delete_supplier(user.business_id, supplier_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Substring search across orders, menu items and inventory
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchResults>> {
    let service = BusinessService::new(state.db);
    let results = service.search(user.business_id, &query.q).await?;
    Ok(Json(results))
}
