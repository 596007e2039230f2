//! Approval administration handlers.

use crate::api::rest::auth::AuthedUser;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use warden_types::{ApprovalId, ApprovalRequest, ApprovalStatus, UserId};

#[derive(Debug, Serialize)]
pub struct ApprovalsResponse {
    pub message: String,
    pub approvals: Vec<ApprovalRequest>,
}

pub async fn get_approvals(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
) -> ApiResult<Json<ApprovalsResponse>> {
    let approvals = state.service.list_approvals(&caller)?;
    Ok(Json(ApprovalsResponse {
        message: "Approvals fetched successfully".to_string(),
        approvals,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApprovalPayload {
    pub user_id: String,
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct CreateApprovalResponse {
    pub message: String,
    pub approval: ApprovalRequest,
}

pub async fn create_approval(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Json(payload): Json<CreateApprovalPayload>,
) -> ApiResult<(StatusCode, Json<CreateApprovalResponse>)> {
    let approval = state.service.create_approval(
        &caller,
        &UserId::new(payload.user_id),
        &payload.command,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(CreateApprovalResponse {
            message: "Approval request created successfully".to_string(),
            approval,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateApprovalPayload {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateApprovalResponse {
    pub message: String,
    pub approval: ApprovalRequest,
}

pub async fn update_approval(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateApprovalPayload>,
) -> ApiResult<Json<UpdateApprovalResponse>> {
    let status = ApprovalStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::BadRequest("invalid approval status".to_string()))?;

    let approval = state
        .service
        .resolve_approval(&caller, &ApprovalId::new(id), status)?;
    Ok(Json(UpdateApprovalResponse {
        message: "Approval request updated successfully".to_string(),
        approval,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteApprovalResponse {
    pub message: String,
}

pub async fn delete_approval(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteApprovalResponse>> {
    let approval = state.service.delete_approval(&caller, &ApprovalId::new(id))?;
    Ok(Json(DeleteApprovalResponse {
        message: format!("Approval request {} deleted successfully", approval.approval_id),
    }))
}
