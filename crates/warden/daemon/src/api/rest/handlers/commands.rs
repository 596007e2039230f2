//! Member-facing command handlers.

use crate::api::rest::auth::AuthedUser;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use warden_types::{CommandLogEntry, Decision};

#[derive(Debug, Deserialize)]
pub struct ExecuteCommandPayload {
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct ExecuteCommandResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<String>,
}

/// Submit a command for governance evaluation.
pub async fn execute_command(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
    Json(payload): Json<ExecuteCommandPayload>,
) -> ApiResult<Json<ExecuteCommandResponse>> {
    let outcome = state.service.execute_command(&user, &payload.command)?;

    let (status, approval_id) = match &outcome.decision {
        Decision::Accept => ("executed", None),
        Decision::Reject => ("rejected", None),
        Decision::PendingApproval(id) => ("pending_approval", Some(id.0.clone())),
    };

    Ok(Json(ExecuteCommandResponse {
        status: status.to_string(),
        message: outcome.message,
        approval_id,
    }))
}

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub message: String,
    pub credits: i64,
}

pub async fn get_credits(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
) -> ApiResult<Json<CreditsResponse>> {
    let credits = state.service.credits(&user)?;
    Ok(Json(CreditsResponse {
        message: "Credits fetched successfully".to_string(),
        credits,
    }))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub message: String,
    pub history: Vec<CommandLogEntry>,
}

pub async fn get_history(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
) -> ApiResult<Json<HistoryResponse>> {
    let history = state.service.history(&user)?;
    Ok(Json(HistoryResponse {
        message: "History fetched successfully".to_string(),
        history,
    }))
}
