//! Staff directory handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::staff::{CreateStaffInput, StaffDetail, UpdateStaffInput};
use crate::services::StaffService;
use crate::AppState;
use shared::StaffMember;

pub async fn list_staff(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<StaffMember>>> {
    user.require("staff", "view")?;
    let service = StaffService::new(state.db);
    let staff = service.list_staff(user.business_id).await?;
    Ok(Json(staff))
}

/// Staff member with the permissions of their role
pub async fn get_staff(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(staff_id): Path<Uuid>,
) -> AppResult<Json<StaffDetail>> {
    user.require("staff", "view")?;
    let service = StaffService::new(state.db);
    let member = service.get_staff(user.business_id, staff_id).await?;
    Ok(Json(member))
}

pub async fn create_staff(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateStaffInput>,
) -> AppResult<(StatusCode, Json<StaffMember>)> {
    user.require("staff", "create")?;
    let service = StaffService::new(state.db);
    let member = service.create_staff(user.business_id, input).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_staff(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(staff_id): Path<Uuid>,
    Json(input): Json<UpdateStaffInput>,
) -> AppResult<Json<StaffMember>> {
    user.require("staff", "update")?;
    let service = StaffService::new(state.db);
    let member = service.update_staff(user.business_id, staff_id, input).await?;
    Ok(Json(member))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(staff_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require("staff", "delete")?;
    let service = StaffService::new(state.db);
    service.delete_staff(user.business_id, staff_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
