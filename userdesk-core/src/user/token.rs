//! JWT 会话 token：签发与验证

use super::models::TokenClaims;
use crate::error::TokenError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

const DEFAULT_JWT_ISSUER: &str = "userdesk-api";
const DEFAULT_JWT_AUDIENCE: &str = "userdesk-clients";

/// 会话 token 签发者
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, email: &str, user_id: &str) -> Result<String, TokenError>;

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

/// HS256 JWT 实现
#[derive(Debug, Clone)]
pub struct JwtIssuer {
    secret: String,
    issuer: String,
    audience: String,
    /// token 有效期（秒）
    ttl: i64,
}

impl JwtIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_JWT_ISSUER.to_string(),
            audience: DEFAULT_JWT_AUDIENCE.to_string(),
            ttl: 24 * 3600, // 1 天
        }
    }

    /// 配置 JWT iss/aud
    pub fn with_claims_context(
        mut self,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        self.issuer = issuer.into();
        self.audience = audience.into();
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, email: &str, user_id: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iss: Some(self.issuer.clone()),
            aud: Some(self.audience.clone()),
            exp: (now + Duration::seconds(self.ttl)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Sign(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&[self.issuer.clone()]);
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}
