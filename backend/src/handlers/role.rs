//! Role management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::role::{CreateRoleInput, UpdateRoleInput};
use crate::services::RoleService;
use crate::AppState;
use shared::{all_permissions, RoleWithPermissions};

/// Response for list of roles
#[derive(Serialize)]
pub struct RolesResponse {
    pub roles: Vec<RoleWithPermissions>,
    /// Every grantable `resource:action` pair
    pub available_permissions: Vec<String>,
}

/// Get all roles for the current business
pub async fn list_roles(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RolesResponse>, AppError> {
    user.require("roles", "view")?;

    let role_service = RoleService::new(state.db.clone());
    let roles = role_service.list_roles(user.business_id).await?;

    Ok(Json(RolesResponse {
        roles,
        available_permissions: all_permissions(),
    }))
}

/// Get a specific role with its permissions
pub async fn get_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(role_id): Path<Uuid>,
) -> Result<Json<RoleWithPermissions>, AppError> {
    user.require("roles", "view")?;

    let role_service = RoleService::new(state.db.clone());
    let role = role_service.get_role(user.business_id, role_id).await?;

    Ok(Json(role))
}

/// Create a custom role
pub async fn create_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateRoleInput>,
) -> Result<(StatusCode, Json<RoleWithPermissions>), AppError> {
    user.require("roles", "create")?;

    let role_service = RoleService::new(state.db.clone());
    let role = role_service.create_role(user.business_id, input).await?;

    Ok((StatusCode::CREATED, Json(role)))
}

/// Update a role; system roles only take permission changes
pub async fn update_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(role_id): Path<Uuid>,
    Json(input): Json<UpdateRoleInput>,
) -> Result<Json<RoleWithPermissions>, AppError> {
    user.require("roles", "update")?;

    let role_service = RoleService::new(state.db.clone());
    let role = role_service
        .update_role(user.business_id, role_id, input)
        .await?;

    Ok(Json(role))
}
