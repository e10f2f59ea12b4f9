//! 认证相关 API handlers

use axum::extract::State;
use axum::Json;
use userdesk_core::{LoginRequest, LoginSuccess};

use super::super::error::ApiError;
use super::super::extract::ApiJson;
use super::super::middleware::ClientIp;
use super::super::state::AppState;

/// POST /api/authentication/login - 用户登录
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginSuccess>, ApiError> {
    if !state.login_limiter.allow(&ip).await {
        tracing::warn!(ip = %ip, "login rate limit hit");
        return Err(ApiError::too_many_requests(
            "Terlalu banyak permintaan, silahkan coba lagi nanti.",
        ));
    }

    let success = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(success))
}
