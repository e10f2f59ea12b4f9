use axum::http::{StatusCode, Uri};
use axum::Json;
use serde_json::json;

use super::super::middleware::ClientIp;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 处理 404 错误，记录可疑请求
pub async fn handler_404(uri: Uri, ClientIp(ip): ClientIp) -> (StatusCode, Json<serde_json::Value>) {
    tracing::warn!(path = %uri.path(), ip = %ip, "404 request");

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": "NOT_FOUND",
            "message": "Route tidak ditemukan"
        })),
    )
}
