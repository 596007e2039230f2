//! Role administration handlers.

use crate::api::rest::auth::AuthedUser;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use warden_types::{Role, RoleId, User, UserId};

#[derive(Debug, Deserialize)]
pub struct CreateRolePayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRoleResponse {
    pub message: String,
    pub role: Role,
}

pub async fn create_role(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Json(payload): Json<CreateRolePayload>,
) -> ApiResult<(StatusCode, Json<CreateRoleResponse>)> {
    let role = state
        .service
        .create_role(&caller, &payload.name, &payload.description)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateRoleResponse {
            message: "Role created successfully".to_string(),
            role,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct DeleteRoleResponse {
    pub message: String,
}

pub async fn delete_role(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteRoleResponse>> {
    let role = state.service.delete_role(&caller, &RoleId::new(id))?;
    Ok(Json(DeleteRoleResponse {
        message: format!("Role {} deleted successfully", role.role_id),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRolePayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateRoleResponse {
    pub message: String,
    pub role: Role,
}

pub async fn update_role(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRolePayload>,
) -> ApiResult<Json<UpdateRoleResponse>> {
    let role = state.service.update_role(
        &caller,
        &RoleId::new(id),
        payload.name,
        payload.description,
    )?;
    Ok(Json(UpdateRoleResponse {
        message: "Role updated successfully".to_string(),
        role,
    }))
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub message: String,
    pub roles: Vec<Role>,
}

pub async fn get_roles(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
) -> ApiResult<Json<RolesResponse>> {
    let roles = state.service.list_roles(&caller)?;
    Ok(Json(RolesResponse {
        message: "Roles fetched successfully".to_string(),
        roles,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolePayload {
    pub user_id: String,
    pub role_id: String,
}

#[derive(Debug, Serialize)]
pub struct AssignRoleResponse {
    pub message: String,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub async fn assign_role(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Json(payload): Json<AssignRolePayload>,
) -> ApiResult<Json<AssignRoleResponse>> {
    let assignment = state.service.assign_role(
        &caller,
        &UserId::new(payload.user_id),
        &RoleId::new(payload.role_id),
    )?;
    Ok(Json(AssignRoleResponse {
        message: "Role assigned successfully".to_string(),
        user: assignment.user,
        warning: assignment.warning,
    }))
}
