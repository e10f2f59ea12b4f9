use axum::extract::FromRequest;

use super::error::ApiError;

/// JSON 请求体；解析失败时返回 `{code, message}` 而不是纯文本
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
