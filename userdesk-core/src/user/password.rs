//! 密码管理：校验当前密码、修改密码

use super::models::*;
use super::UserManager;
use crate::error::{Result, UserError};
use tracing::{info, instrument, warn};

impl UserManager {
    /// 校验用户密码；用户不存在时返回 `NotFound` 错误
    #[instrument(skip(self, password))]
    pub async fn check_password(&self, id: &str, password: &str) -> Result<bool> {
        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        Ok(self.hasher.matches(password, &user.password_hash).await?)
    }

    /// 修改用户密码；先确认用户存在，再计算哈希
    #[instrument(skip(self, password))]
    pub async fn change_password(&self, id: &str, password: &str) -> Result<WriteOutcome<()>> {
        if self.store.find_by_id(id).await?.is_none() {
            return Ok(WriteOutcome::NotFound);
        }

        Self::validate_password(password)?;
        let password_hash = self.hasher.hash(password).await?;

        let patch = UserPatch {
            password_hash: Some(password_hash),
            ..Default::default()
        };
        match self.store.update_fields(id, patch).await {
            Ok(_) => {
                info!(user_id = %id, "password changed");
                Ok(WriteOutcome::Written(()))
            }
            Err(e) => {
                warn!(user_id = %id, error = %e, "change password failed");
                Ok(WriteOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CredentialStore, MemoryStore};
    use crate::user::testing::{user, CountingHasher};
    use std::sync::Arc;

    async fn setup() -> (UserManager, Arc<CountingHasher>) {
        let store = Arc::new(MemoryStore::new());
        let mut acep = user("4", "Acep", "acep@test.com");
        acep.password_hash = "plain:lama123".into();
        store.insert(acep).await.unwrap();
        let hasher = Arc::new(CountingHasher::default());
        (UserManager::new(store, hasher.clone()), hasher)
    }

    #[tokio::test]
    async fn change_password_for_missing_user_skips_hashing() {
        let (manager, hasher) = setup().await;
        let outcome = manager.change_password("missing", "baru1234").await.unwrap();
        assert_eq!(outcome, WriteOutcome::NotFound);
        assert_eq!(hasher.hash_calls(), 0);
    }

    #[tokio::test]
    async fn change_password_then_check() {
        let (manager, hasher) = setup().await;
        let outcome = manager.change_password("4", "baru1234").await.unwrap();
        assert!(outcome.is_written());
        assert_eq!(hasher.hash_calls(), 1);
        assert!(manager.check_password("4", "baru1234").await.unwrap());
        assert!(!manager.check_password("4", "lama123").await.unwrap());
    }

    #[tokio::test]
    async fn check_password_for_missing_user_is_an_error() {
        let (manager, _) = setup().await;
        let err = manager.check_password("missing", "x").await.unwrap_err();
        assert!(matches!(err, UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn change_password_rejects_short_password() {
        let (manager, hasher) = setup().await;
        let err = manager.change_password("4", "123").await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
        assert_eq!(hasher.hash_calls(), 0);
    }
}
