use std::sync::Arc;
use userdesk_core::{Authenticator, TokenIssuer, UserManager};

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserManager>,
    /// 登录流程（含按 email 的尝试计数）
    pub auth: Arc<Authenticator>,
    /// 用于校验 Bearer token
    pub tokens: Arc<dyn TokenIssuer>,
    /// 登录接口限流（按 IP）
    pub login_limiter: Arc<crate::app::RateLimiter>,
    /// 是否信任 X-Real-IP / X-Forwarded-For（仅在反向代理之后开启）
    pub trust_proxy_headers: bool,
}
