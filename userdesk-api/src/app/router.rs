use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    change_password, create_user, delete_user, get_user, handler_404, health, list_users, login,
    update_user,
};
use super::middleware::auth_middleware;
use super::state::AppState;

/// 根据配置的来源列表构建 CorsLayer
fn build_cors_layer(cors_origins: Vec<String>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    if cors_origins.is_empty() {
        tracing::warn!(
            "UD_CORS_ORIGINS not configured, allowing all origins. \
             Set UD_CORS_ORIGINS in production."
        );
        // any() 不能与 credentials(true) 共用
        base.allow_origin(AllowOrigin::any())
            .allow_credentials(false)
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .into_iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        base.allow_origin(origins)
    }
}

/// Build the router with routes and middleware wired.
pub fn app_router(state: AppState, cors_origins: Vec<String>) -> Router {
    // 登录（公开，按 IP 限流）
    let auth_routes = Router::new().route("/authentication/login", post(login));

    // 用户管理（需要 Bearer token）
    let user_routes = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/change-password", post(change_password));

    Router::new()
        .route("/health", get(health))
        .nest("/api", auth_routes.merge(user_routes))
        .fallback(handler_404)
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}
