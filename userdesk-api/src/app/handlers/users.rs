//! 用户管理 API handlers（需要登录）

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use userdesk_core::{
    ChangePasswordRequest, CreateUserRequest, ListQuery, Page, UpdateUserRequest, UserManager,
    UserSummary, WriteOutcome,
};

use super::super::error::ApiError;
use super::super::extract::ApiJson;
use super::super::middleware::AuthInfo;
use super::super::state::AppState;

/// 列表查询参数（原始字符串，由 core 层校验）
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub page_number: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// GET /api/users - 分页列出用户
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<Page<UserSummary>>, ApiError> {
    let query = ListQuery::parse(
        params.page_number.as_deref(),
        params.page_size.as_deref(),
        params.sort.as_deref(),
        params.search.as_deref(),
    )?;
    let page = state.users.list_users(&query).await?;
    Ok(Json(page))
}

/// GET /api/users/:id - 获取用户详情
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserSummary>, ApiError> {
    state
        .users
        .get_user(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Pengguna tidak ditemukan"))
}

/// POST /api/users - 创建用户
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    UserManager::validate_create(&req)?;
    if req.password != req.password_confirm {
        return Err(ApiError::invalid_password(
            "Konfirmasi password tidak cocok",
        ));
    }
    if state.users.email_is_registered(&req.email).await? {
        return Err(ApiError::email_taken());
    }

    match state
        .users
        .create_user(&req.name, &req.email, &req.password)
        .await?
    {
        WriteOutcome::Written(user) => {
            tracing::info!(actor = %auth.user_id(), user_id = %user.id, "user created via api");
            Ok((StatusCode::CREATED, Json(user)))
        }
        WriteOutcome::NotFound | WriteOutcome::Failed => {
            Err(ApiError::unprocessable("Gagal membuat pengguna"))
        }
    }
}

/// PUT /api/users/:id - 更新用户资料
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    UserManager::validate_update(&req)?;
    let current = state
        .users
        .get_user(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pengguna tidak ditemukan"))?;
    // 只有换成别人已注册的 email 才算冲突
    if current.email != req.email && state.users.email_is_registered(&req.email).await? {
        return Err(ApiError::email_taken());
    }

    match state.users.update_user(&id, &req.name, &req.email).await? {
        WriteOutcome::Written(user) => {
            tracing::info!(actor = %auth.user_id(), user_id = %id, "user updated via api");
            Ok(Json(user))
        }
        WriteOutcome::NotFound => Err(ApiError::not_found("Pengguna tidak ditemukan")),
        WriteOutcome::Failed => Err(ApiError::unprocessable("Gagal memperbarui pengguna")),
    }
}

/// DELETE /api/users/:id - 删除用户
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.users.delete_user(&id).await? {
        WriteOutcome::Written(()) => {
            tracing::info!(actor = %auth.user_id(), user_id = %id, "user deleted via api");
            Ok(Json(json!({ "id": id })))
        }
        WriteOutcome::NotFound => Err(ApiError::not_found("Pengguna tidak ditemukan")),
        WriteOutcome::Failed => Err(ApiError::unprocessable("Gagal menghapus pengguna")),
    }
}

/// POST /api/users/:id/change-password - 修改密码（需提供旧密码）
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.password_new != req.password_confirm {
        return Err(ApiError::invalid_password(
            "Konfirmasi password tidak cocok",
        ));
    }
    if !state.users.check_password(&id, &req.password_old).await? {
        return Err(ApiError::invalid_password("Password lama salah"));
    }

    match state.users.change_password(&id, &req.password_new).await? {
        WriteOutcome::Written(()) => {
            tracing::info!(actor = %auth.user_id(), user_id = %id, "password changed via api");
            Ok(Json(json!({ "id": id })))
        }
        WriteOutcome::NotFound => Err(ApiError::not_found("Pengguna tidak ditemukan")),
        WriteOutcome::Failed => Err(ApiError::unprocessable("Gagal mengubah password")),
    }
}
