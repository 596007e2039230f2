//! Bearer-token authentication extractor.

use super::state::AppState;
use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use warden_types::User;

/// The authenticated caller. Authorization (who may do what) happens in the
/// governance service's central gate; this extractor only establishes who is
/// calling.
pub struct AuthedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing or invalid token".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("missing or invalid token".to_string()))?;

        let user = state
            .service
            .authenticate(token)
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::Unauthorized("unknown credential".to_string()))?;

        Ok(AuthedUser(user))
    }
}
