//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/execute-command", post(handlers::execute_command))
        .route("/credits", get(handlers::get_credits))
        .route("/history", get(handlers::get_history));

    let admin_routes = Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        // Users
        .route("/create-user", post(handlers::create_user))
        .route("/delete-user/:id", delete(handlers::delete_user))
        .route("/update-user/:id", put(handlers::update_user))
        .route("/get-users", get(handlers::get_users))
        // Rules
        .route("/create-rule", post(handlers::create_rule))
        .route("/delete-rule/:id", delete(handlers::delete_rule))
        .route("/get-rules", get(handlers::get_rules))
        .route("/get-logs", get(handlers::get_logs))
        // Roles
        .route("/create-role", post(handlers::create_role))
        .route("/delete-role/:id", delete(handlers::delete_role))
        .route("/update-role/:id", put(handlers::update_role))
        .route("/get-roles", get(handlers::get_roles))
        .route("/assign-role", post(handlers::assign_role))
        // Approvals
        .route("/get-approvals", get(handlers::get_approvals))
        .route("/create-approval", post(handlers::create_approval))
        .route("/update-approval/:id", put(handlers::update_approval))
        .route("/delete-approval/:id", delete(handlers::delete_approval))
        // Approvals (list-style aliases)
        .route("/get-approvals-list", get(handlers::get_approvals))
        .route(
            "/update-approvals-list/:id",
            put(handlers::update_approval),
        )
        .route(
            "/delete-approvals-list/:id",
            delete(handlers::delete_approval),
        );

    Router::new()
        .nest("/user", user_routes)
        .nest("/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;
    use warden_service::{GovernanceConfig, GovernanceService};
    use warden_types::User;

    fn state() -> (AppState, User) {
        let service = Arc::new(GovernanceService::new(GovernanceConfig::default()));
        let (admin, _) = service
            .seed_admin("admin@example.com", "admin user", "1234567890")
            .unwrap();
        (AppState { service }, admin)
    }

    fn bearer(user: &User) -> String {
        format!("Bearer {}", user.api_key)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (state, _) = state();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user/credits")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_can_create_and_list_rules() {
        let (state, admin) = state();
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/create-rule")
                    .header(header::AUTHORIZATION, bearer(&admin))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({"pattern": "^ls", "action": "AUTO_ACCEPT"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/admin/get-rules")
                    .header(header::AUTHORIZATION, bearer(&admin))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["rules"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_pattern_is_a_bad_request() {
        let (state, admin) = state();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/create-rule")
                    .header(header::AUTHORIZATION, bearer(&admin))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({"pattern": "([oops", "action": "AUTO_ACCEPT"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn member_is_forbidden_from_admin_routes() {
        let (state, admin) = state();
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/create-user")
                    .header(header::AUTHORIZATION, bearer(&admin))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "mail": "m@example.com",
                            "name": "member",
                            "phone": "555",
                            "userType": "MEMBER"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let member_key = created["api_key"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/admin/get-rules")
                    .header(header::AUTHORIZATION, format!("Bearer {}", member_key))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unmatched_command_is_queued_for_approval() {
        let (state, admin) = state();
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/user/execute-command")
                    .header(header::AUTHORIZATION, bearer(&admin))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({"command": "mystery --flag"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "pending_approval");
        assert!(body["approval_id"].is_string());

        // The alias route sees the same approval store.
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/admin/get-approvals-list")
                    .header(header::AUTHORIZATION, bearer(&admin))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["approvals"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolving_twice_conflicts() {
        let (state, admin) = state();
        let app = create_router(state.clone());

        let outcome = state
            .service
            .execute_command(&admin, "needs approval")
            .unwrap();
        let warden_types::Decision::PendingApproval(approval_id) = outcome.decision else {
            panic!("expected pending approval");
        };

        let update = |status: &str| {
            Request::builder()
                .method("PUT")
                .uri(format!("/admin/update-approval/{}", approval_id.0))
                .header(header::AUTHORIZATION, bearer(&admin))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "status": status }).to_string(),
                ))
                .unwrap()
        };

        let response = app.clone().oneshot(update("APPROVED")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(update("REJECTED")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
