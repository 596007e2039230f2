//! User administration handlers.

use crate::api::rest::auth::AuthedUser;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use warden_rbac::NewUser;
use warden_service::{UpdateUser, UserAccount};
use warden_types::{Permission, UserId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub mail: String,
    pub name: String,
    pub phone: String,
    pub user_type: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub message: String,
    pub user_id: String,
    /// Shown only in this response; not retrievable afterwards.
    pub api_key: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Json(payload): Json<CreateUserPayload>,
) -> ApiResult<(StatusCode, Json<CreateUserResponse>)> {
    let permission = Permission::parse(&payload.user_type)
        .ok_or_else(|| ApiError::BadRequest("invalid user type".to_string()))?;

    let user = state.service.create_user(
        &caller,
        NewUser {
            mail: payload.mail,
            name: payload.name,
            phone: payload.phone,
            permission,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully".to_string(),
            user_id: user.user_id.0,
            api_key: user.api_key,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user = state.service.delete_user(&caller, &UserId::new(id))?;
    Ok(Json(MessageResponse {
        message: format!("User {} deleted successfully", user.user_id),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub user_type: Option<String>,
    pub credits: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateUserResponse {
    pub message: String,
    pub user: UserAccount,
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserPayload>,
) -> ApiResult<Json<UpdateUserResponse>> {
    let permission = match payload.user_type {
        Some(raw) => Some(
            Permission::parse(&raw)
                .ok_or_else(|| ApiError::BadRequest("invalid user type".to_string()))?,
        ),
        None => None,
    };

    let account = state.service.update_user(
        &caller,
        &UserId::new(id),
        UpdateUser {
            name: payload.name,
            phone: payload.phone,
            permission,
            credits: payload.credits,
        },
    )?;

    Ok(Json(UpdateUserResponse {
        message: "User updated successfully".to_string(),
        user: account,
    }))
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub message: String,
    pub users: Vec<UserAccount>,
}

pub async fn get_users(
    State(state): State<AppState>,
    AuthedUser(caller): AuthedUser,
) -> ApiResult<Json<UsersResponse>> {
    let users = state.service.list_users(&caller)?;
    Ok(Json(UsersResponse {
        message: "Users fetched successfully".to_string(),
        users,
    }))
}
