//! 登录流程：校验凭据、记录尝试次数、判定是否锁定

use super::attempts::AttemptTracker;
use super::crypto::PasswordHasher;
use super::models::LoginSuccess;
use super::token::TokenIssuer;
use crate::error::AuthError;
use crate::store::CredentialStore;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 默认锁定阈值：窗口内失败次数达到 5 次
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn TokenIssuer>,
    attempts: Arc<dyn AttemptTracker>,
    max_attempts: u32,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn TokenIssuer>,
        attempts: Arc<dyn AttemptTracker>,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
            attempts,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn attempts(&self) -> &Arc<dyn AttemptTracker> {
        &self.attempts
    }

    /// 用户登录
    ///
    /// 每次调用都会计入尝试次数（包括最终成功的调用），成功后删除该 email 的记录。
    /// 用户不存在与密码错误不作区分。
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        let user = self.store.find_by_email(email).await?;

        self.attempts.record_attempt(email).await;

        let matched = match &user {
            Some(user) => self.hasher.matches(password, &user.password_hash).await?,
            None => false,
        };

        if let (true, Some(user)) = (matched, user) {
            self.attempts.clear(email).await;
            let token = self.issuer.issue(&user.email, &user.id)?;
            info!(user_id = %user.id, "user logged in");
            return Ok(LoginSuccess {
                email: user.email,
                name: user.name,
                user_id: user.id,
                token,
            });
        }

        let count = self.attempts.info(email).await.map_or(0, |r| r.count);
        if count >= self.max_attempts {
            warn!(attempts = count, "login locked out: too many attempts");
            return Err(AuthError::TooManyAttempts);
        }
        warn!(attempts = count, "login failed: invalid credentials");
        Err(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::user::attempts::{default_window, MemoryAttemptTracker};
    use crate::user::testing::{seeded_store, ManualClock};
    use crate::user::token::JwtIssuer;
    use crate::user::BcryptHasher;
    use chrono::Duration;

    async fn setup() -> (Authenticator, Arc<ManualClock>, Arc<JwtIssuer>) {
        let hasher = Arc::new(BcryptHasher::with_cost(4));
        let store: Arc<MemoryStore> = seeded_store(hasher.as_ref(), "rahasia123").await;
        let clock = Arc::new(ManualClock::new());
        let tracker = Arc::new(MemoryAttemptTracker::with_clock(
            default_window(),
            clock.clone(),
        ));
        let issuer = Arc::new(JwtIssuer::new("test-secret"));
        let auth = Authenticator::new(store, hasher, issuer.clone(), tracker);
        (auth, clock, issuer)
    }

    #[tokio::test]
    async fn successful_login_returns_payload_and_token() {
        let (auth, _clock, issuer) = setup().await;
        let ok = auth.login("acep@test.com", "rahasia123").await.unwrap();
        assert_eq!(ok.email, "acep@test.com");
        assert_eq!(ok.name, "Acep");
        assert_eq!(ok.user_id, "4");
        let claims = issuer.verify(&ok.token).unwrap();
        assert_eq!(claims.sub, "4");
        assert!(auth.attempts().info("acep@test.com").await.is_none());
    }

    #[tokio::test]
    async fn fifth_failure_reaches_lockout() {
        let (auth, _clock, _) = setup().await;
        for _ in 0..4 {
            let err = auth.login("acep@test.com", "salah").await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        // 第 5 次失败时计数已达到阈值
        let err = auth.login("acep@test.com", "salah").await.unwrap_err();
        assert!(matches!(err, AuthError::TooManyAttempts));
        let err = auth.login("acep@test.com", "salah").await.unwrap_err();
        assert!(matches!(err, AuthError::TooManyAttempts));
    }

    #[tokio::test]
    async fn correct_password_still_succeeds_after_lockout_threshold() {
        let (auth, _clock, _) = setup().await;
        for _ in 0..6 {
            let _ = auth.login("acep@test.com", "salah").await;
        }
        assert!(auth.login("acep@test.com", "rahasia123").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_email_counts_like_wrong_password() {
        let (auth, _clock, _) = setup().await;
        for _ in 0..4 {
            let err = auth.login("ghost@test.com", "x").await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        let err = auth.login("ghost@test.com", "x").await.unwrap_err();
        assert!(matches!(err, AuthError::TooManyAttempts));
    }

    #[tokio::test]
    async fn success_clears_counter() {
        let (auth, _clock, _) = setup().await;
        for _ in 0..4 {
            let _ = auth.login("bob@test.com", "salah").await;
        }
        auth.login("bob@test.com", "rahasia123").await.unwrap();
        let _ = auth.login("bob@test.com", "salah").await;
        let info = auth.attempts().info("bob@test.com").await.unwrap();
        assert_eq!(info.count, 1);
    }

    #[tokio::test]
    async fn stale_counter_resets_after_window() {
        let (auth, clock, _) = setup().await;
        for _ in 0..5 {
            let _ = auth.login("bob@test.com", "salah").await;
        }
        clock.advance(Duration::minutes(31));
        let err = auth.login("bob@test.com", "salah").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        let info = auth.attempts().info("bob@test.com").await.unwrap();
        assert_eq!(info.count, 1);
    }

    #[tokio::test]
    async fn custom_threshold() {
        let (auth, _clock, _) = setup().await;
        let auth = auth.with_max_attempts(2);
        let err = auth.login("bob@test.com", "salah").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        let err = auth.login("bob@test.com", "salah").await.unwrap_err();
        assert!(matches!(err, AuthError::TooManyAttempts));
    }
}
