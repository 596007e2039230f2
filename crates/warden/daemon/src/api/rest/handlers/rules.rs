//! Rule administration handlers.

use crate::api::rest::auth::AuthedUser;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use warden_types::{Rule, RuleAction, RuleId};

#[derive(Debug, Deserialize)]
pub struct CreateRulePayload {
    pub pattern: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRuleResponse {
    pub message: String,
    pub rule: Rule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Rule>,
}

pub async fn create_rule(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Json(payload): Json<CreateRulePayload>,
) -> ApiResult<(StatusCode, Json<CreateRuleResponse>)> {
    let action = RuleAction::parse(&payload.action)
        .ok_or_else(|| ApiError::BadRequest("invalid action type".to_string()))?;

    let created = state.service.create_rule(&caller, &payload.pattern, action)?;

    let (message, warning) = if created.overlaps.is_empty() {
        ("Rule created successfully".to_string(), None)
    } else {
        (
            format!(
                "Rule created but may conflict with {} existing rule(s)",
                created.overlaps.len()
            ),
            Some("POTENTIAL_CONFLICTS".to_string()),
        )
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateRuleResponse {
            message,
            rule: created.rule,
            warning,
            conflicts: created.overlaps,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct DeleteRuleResponse {
    pub message: String,
}

pub async fn delete_rule(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteRuleResponse>> {
    let rule = state.service.delete_rule(&caller, &RuleId::new(id))?;
    Ok(Json(DeleteRuleResponse {
        message: format!("Rule {} deleted successfully", rule.rule_id),
    }))
}

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub message: String,
    pub rules: Vec<Rule>,
}

pub async fn get_rules(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
) -> ApiResult<Json<RulesResponse>> {
    let rules = state.service.list_rules(&caller)?;
    Ok(Json(RulesResponse {
        message: "Rules fetched successfully".to_string(),
        rules,
    }))
}
