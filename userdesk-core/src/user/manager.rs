//! 用户管理器：用户 CRUD 与列表查询

use super::crypto::PasswordHasher;
use super::models::*;
use super::query::{ListQuery, Page};
use crate::error::{Result, UserError};
use crate::store::{CredentialStore, UserFilter};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

const MAX_NAME_LEN: usize = 100;
pub(super) const MIN_PASSWORD_LEN: usize = 6;
pub(super) const MAX_PASSWORD_LEN: usize = 32;

/// 用户管理器
#[derive(Clone)]
pub struct UserManager {
    pub(super) store: Arc<dyn CredentialStore>,
    pub(super) hasher: Arc<dyn PasswordHasher>,
}

impl UserManager {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }
}

// ============================================================================
// 请求校验
// ============================================================================

impl UserManager {
    pub(super) fn validate_profile(name: &str, email: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(UserError::Validation(format!(
                "name harus 1-{MAX_NAME_LEN} karakter"
            )));
        }
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            })
            && !email.contains(char::is_whitespace);
        if !valid_email {
            return Err(UserError::Validation("email tidak valid".into()));
        }
        Ok(())
    }

    pub(super) fn validate_password(password: &str) -> Result<()> {
        let len = password.chars().count();
        if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
            return Err(UserError::Validation(format!(
                "password harus {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} karakter"
            )));
        }
        Ok(())
    }

    /// 校验创建请求（不含“两次密码是否一致”，由调用方处理）
    pub fn validate_create(req: &CreateUserRequest) -> Result<()> {
        Self::validate_profile(&req.name, &req.email)?;
        Self::validate_password(&req.password)
    }

    pub fn validate_update(req: &UpdateUserRequest) -> Result<()> {
        Self::validate_profile(&req.name, &req.email)
    }
}

// ============================================================================
// 用户 CRUD 操作
// ============================================================================

impl UserManager {
    /// 分页列出用户（已去除密码哈希）
    #[instrument(skip(self))]
    pub async fn list_users(&self, query: &ListQuery) -> Result<Page<UserSummary>> {
        let filter = UserFilter::from(query);
        let total = self.store.count_matching(&filter).await?;
        let users = self
            .store
            .find_matching(&filter, &query.sort, query.skip(), query.limit())
            .await?;
        Ok(Page::new(query, total, users).map(UserSummary::from))
    }

    /// 获取用户
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> Result<Option<UserSummary>> {
        Ok(self.store.find_by_id(id).await?.map(UserSummary::from))
    }

    /// email 是否已被注册
    pub async fn email_is_registered(&self, email: &str) -> Result<bool> {
        Ok(self.store.find_by_email(email).await?.is_some())
    }

    /// 创建用户；写入失败（例如 email 重复）返回 `Failed` 而不是错误
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<WriteOutcome<UserSummary>> {
        let password_hash = self.hasher.hash(password).await?;

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.to_string(),
            password_hash,
            created_at: Some(now),
            updated_at: Some(now),
        };

        match self.store.insert(user).await {
            Ok(user) => {
                info!(user_id = %user.id, "created user");
                Ok(WriteOutcome::Written(user.into()))
            }
            Err(e) => {
                warn!(error = %e, "create user failed");
                Ok(WriteOutcome::Failed)
            }
        }
    }

    /// 更新用户资料
    #[instrument(skip(self))]
    pub async fn update_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
    ) -> Result<WriteOutcome<UserSummary>> {
        if self.store.find_by_id(id).await?.is_none() {
            return Ok(WriteOutcome::NotFound);
        }

        let patch = UserPatch {
            name: Some(name.trim().to_string()),
            email: Some(email.to_string()),
            password_hash: None,
        };
        match self.store.update_fields(id, patch).await {
            Ok(user) => {
                info!(user_id = %id, "updated user");
                Ok(WriteOutcome::Written(user.into()))
            }
            Err(e) => {
                warn!(user_id = %id, error = %e, "update user failed");
                Ok(WriteOutcome::Failed)
            }
        }
    }

    /// 删除用户
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<WriteOutcome<()>> {
        if self.store.find_by_id(id).await?.is_none() {
            return Ok(WriteOutcome::NotFound);
        }

        match self.store.delete_by_id(id).await {
            Ok(()) => {
                info!(user_id = %id, "deleted user");
                Ok(WriteOutcome::Written(()))
            }
            Err(e) => {
                warn!(user_id = %id, error = %e, "delete user failed");
                Ok(WriteOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::user::query::{SearchSpec, SortOrder, SortSpec, UserField};
    use crate::user::testing::{sample_users, CountingHasher};

    async fn manager_with_samples() -> (UserManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for u in sample_users() {
            store.insert(u).await.unwrap();
        }
        let manager = UserManager::new(store.clone(), Arc::new(CountingHasher::default()));
        (manager, store)
    }

    #[tokio::test]
    async fn first_page_of_eight() {
        let (manager, _) = manager_with_samples().await;
        let query = ListQuery::default().with_page(1, 5);
        let page = manager.list_users(&query).await.unwrap();
        assert_eq!(page.count, 5);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_previous_page);
        assert!(page.has_next_page);
        assert_eq!(page.data[0].email, "acep@test.com");
    }

    #[tokio::test]
    async fn search_then_sort_descending() {
        let (manager, _) = manager_with_samples().await;
        let query = ListQuery::default()
            .with_search(SearchSpec::new(UserField::Email, "test"))
            .with_sort(SortSpec::new(UserField::Email, SortOrder::Desc));
        let page = manager.list_users(&query).await.unwrap();
        let emails: Vec<_> = page.data.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(
            emails,
            vec!["eveline@test.com", "bob@test.com", "acep@test.com"]
        );
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let (manager, _) = manager_with_samples().await;
        let query = ListQuery::default().with_page(3, 5);
        let page = manager.list_users(&query).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.count, 0);
        assert!(page.has_previous_page);
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn create_with_taken_email_fails_softly() {
        let (manager, _) = manager_with_samples().await;
        let outcome = manager
            .create_user("Acep Dua", "acep@test.com", "rahasia123")
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Failed);
    }

    #[tokio::test]
    async fn create_stores_hash_not_plaintext() {
        let (manager, store) = manager_with_samples().await;
        let outcome = manager
            .create_user("Dewi", "dewi@example.com", "rahasia123")
            .await
            .unwrap();
        let WriteOutcome::Written(summary) = outcome else {
            panic!("expected write");
        };
        let stored = store.find_by_id(&summary.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "plain:rahasia123");
        assert!(manager.email_is_registered("dewi@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn update_and_delete_missing_user() {
        let (manager, _) = manager_with_samples().await;
        let outcome = manager
            .update_user("missing", "X", "x@example.com")
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::NotFound);
        assert_eq!(
            manager.delete_user("missing").await.unwrap(),
            WriteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn update_to_taken_email_fails_softly() {
        let (manager, _) = manager_with_samples().await;
        let outcome = manager
            .update_user("5", "Bob", "acep@test.com")
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Failed);
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let (manager, _) = manager_with_samples().await;
        assert!(manager.delete_user("8").await.unwrap().is_written());
        assert!(manager.get_user("8").await.unwrap().is_none());
    }

    #[test]
    fn validation_rules() {
        assert!(UserManager::validate_profile("Acep", "acep@test.com").is_ok());
        assert!(UserManager::validate_profile("", "acep@test.com").is_err());
        assert!(UserManager::validate_profile("Acep", "acep.test.com").is_err());
        assert!(UserManager::validate_password("12345").is_err());
        assert!(UserManager::validate_password("123456").is_ok());
        assert!(UserManager::validate_password(&"x".repeat(33)).is_err());
    }
}
