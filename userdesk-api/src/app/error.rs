use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use userdesk_core::{AuthError, UserError};

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
}

impl ApiError {
    pub fn new(code: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", StatusCode::UNAUTHORIZED, "Akses ditolak")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", StatusCode::NOT_FOUND, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", StatusCode::BAD_REQUEST, message)
    }

    pub fn email_taken() -> Self {
        Self::new(
            "EMAIL_ALREADY_TAKEN",
            StatusCode::CONFLICT,
            "Email sudah terdaftar",
        )
    }

    pub fn invalid_password(message: impl Into<String>) -> Self {
        Self::new("INVALID_PASSWORD", StatusCode::FORBIDDEN, message)
    }

    /// 写入失败（不暴露具体原因）
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(
            "UNPROCESSABLE_ENTITY",
            StatusCode::UNPROCESSABLE_ENTITY,
            message,
        )
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new("TOO_MANY_REQUESTS", StatusCode::TOO_MANY_REQUESTS, message)
    }

    fn server(message: impl Into<String>) -> Self {
        Self::new("SERVER_ERROR", StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::new(
                "INVALID_CREDENTIALS",
                StatusCode::FORBIDDEN,
                err.to_string(),
            ),
            AuthError::TooManyAttempts => ApiError::new(
                "TOO_MANY_ATTEMPTS",
                StatusCode::TOO_MANY_REQUESTS,
                err.to_string(),
            ),
            AuthError::Store(_) | AuthError::Hash(_) | AuthError::Token(_) => {
                tracing::error!(error = %err, "login failed unexpectedly");
                ApiError::server("Terjadi kesalahan pada server")
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => ApiError::not_found("Pengguna tidak ditemukan"),
            UserError::Validation(msg) => ApiError::validation(msg),
            UserError::Hash(_) | UserError::Store(_) => {
                tracing::error!(error = %err, "user operation failed unexpectedly");
                ApiError::server("Terjadi kesalahan pada server")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "rejected request body");
        ApiError::validation(format!("Format data tidak valid: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}
