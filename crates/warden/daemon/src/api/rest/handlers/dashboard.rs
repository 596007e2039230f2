//! Dashboard and log handlers.

use crate::api::rest::auth::AuthedUser;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use serde::Serialize;
use warden_service::DashboardSummary;
use warden_types::CommandLogEntry;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub message: String,
    pub summary: DashboardSummary,
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
) -> ApiResult<Json<DashboardResponse>> {
    let summary = state.service.dashboard(&caller)?;
    Ok(Json(DashboardResponse {
        message: "Admin dashboard data".to_string(),
        summary,
    }))
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub message: String,
    pub logs: Vec<CommandLogEntry>,
}

pub async fn get_logs(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
) -> ApiResult<Json<LogsResponse>> {
    let logs = state.service.logs(&caller)?;
    Ok(Json(LogsResponse {
        message: "Logs fetched successfully".to_string(),
        logs,
    }))
}
