use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use userdesk_core::TokenClaims;

use super::error::ApiError;
use super::state::AppState;

/// 认证信息扩展
#[derive(Debug, Clone)]
pub struct AuthInfo {
	pub claims: TokenClaims,
}

impl AuthInfo {
	pub fn user_id(&self) -> &str {
		&self.claims.sub
	}
}

/// 客户端 IP
/// 开启 `trust_proxy_headers` 时：X-Real-IP > X-Forwarded-For（第一个） > Socket Address
/// 否则只用 Socket Address，客户端无法通过伪造请求头绕过按 IP 限流
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
	type Rejection = Infallible;

	fn from_request_parts<'a, 'b, 'c>(
		parts: &'a mut Parts,
		state: &'b AppState,
	) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'c>>
	where
		'a: 'c,
		'b: 'c,
	{
		let trust_proxy_headers = state.trust_proxy_headers;
		Box::pin(async move {
			let socket = parts
				.extensions
				.get::<ConnectInfo<SocketAddr>>()
				.map(|ci| ci.0);
			Ok(ClientIp(client_ip(&parts.headers, socket, trust_proxy_headers)))
		})
	}
}

fn client_ip(headers: &HeaderMap, socket: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
	if trust_proxy_headers {
		// 1. X-Real-IP（Nginx 常用）
		if let Some(real_ip) = headers
			.get("X-Real-IP")
			.and_then(|v| v.to_str().ok())
			.map(str::trim)
			.filter(|s| !s.is_empty())
		{
			return real_ip.to_string();
		}

		// 2. X-Forwarded-For 最左边是真实客户端
		if let Some(first_ip) = headers
			.get("X-Forwarded-For")
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.split(',').next())
			.map(str::trim)
			.filter(|s| !s.is_empty())
		{
			return first_ip.to_string();
		}
	}

	// 3. 直连 socket 地址
	socket
		.map(|addr| addr.ip().to_string())
		.unwrap_or_else(|| "unknown".to_string())
}

/// 不需要认证的路径
const PUBLIC_PATHS: &[&str] = &["/health", "/api/authentication/login"];

fn bearer_token(request: &Request<Body>) -> Option<&str> {
	request
		.headers()
		.get(axum::http::header::AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|t| !t.is_empty())
}

pub async fn auth_middleware(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Result<Response, ApiError> {
	let path = request.uri().path();

	if PUBLIC_PATHS.iter().any(|p| path == *p) {
		return Ok(next.run(request).await);
	}

	let token = bearer_token(&request).ok_or_else(ApiError::unauthorized)?;
	let claims = match state.tokens.verify(token) {
		Ok(c) => c,
		Err(e) => {
			tracing::debug!(path = %path, error = %e, "rejected bearer token");
			return Err(ApiError::unauthorized());
		}
	};

	request.extensions_mut().insert(AuthInfo { claims });
	Ok(next.run(request).await)
}
