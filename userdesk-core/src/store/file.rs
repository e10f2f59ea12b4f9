//! 基于本地文件系统的用户存储：每个用户一个 JSON 文件，外加 email -> id 索引

use super::{select_page, CredentialStore, UserFilter};
use crate::error::StoreError;
use crate::user::{SortSpec, User, UserPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    /// 串行化写操作，保证索引与用户文件一致
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// 确保用户目录存在
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.users_dir())?;
        Ok(())
    }

    /// 用户存储目录：<data_dir>/users
    fn users_dir(&self) -> PathBuf {
        self.data_dir.join("users")
    }

    fn index_path(&self) -> PathBuf {
        self.users_dir().join("index.json")
    }

    /// 用户文件路径；非法 id 返回 None，避免路径穿越
    fn user_path(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && id != "index"
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        valid.then(|| self.users_dir().join(format!("{}.json", id)))
    }

    async fn load_index(&self) -> HashMap<String, String> {
        match tokio::fs::read(self.index_path()).await {
            Ok(data) => serde_json::from_slice(&data).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    async fn save_index(&self, index: &HashMap<String, String>) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(index)?;
        tokio::fs::write(self.index_path(), data).await?;
        Ok(())
    }

    /// 数据文件已写入后再同步索引；索引只是加速查找，失败时仅记录
    async fn sync_index(&self, index: &HashMap<String, String>) {
        if let Err(e) = self.save_index(index).await {
            warn!(error = %e, "failed to write email index, lookups fall back to a full scan");
        }
    }

    async fn persist(&self, user: &User) -> Result<(), StoreError> {
        let path = self
            .user_path(&user.id)
            .ok_or_else(|| StoreError::NotFound(user.id.clone()))?;
        let data = serde_json::to_vec_pretty(user)?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<User>, StoreError> {
        let Some(path) = self.user_path(id) else {
            return Ok(None);
        };
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// 读取全部用户（跳过 index.json 与损坏的文件）
    async fn load_all(&self) -> Result<Vec<User>, StoreError> {
        self.ensure_dirs()?;
        let mut users = Vec::new();
        let mut entries = tokio::fs::read_dir(self.users_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().map(|s| s == "index").unwrap_or(false) {
                continue;
            }
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let Ok(data) = tokio::fs::read(&path).await else {
                continue;
            };
            match serde_json::from_slice::<User>(&data) {
                Ok(user) => users.push(user),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable user file"),
            }
        }
        Ok(users)
    }

    /// 索引中 email 是否被其他用户占用（索引失效时回退到全量扫描）
    async fn email_owner(
        &self,
        index: &HashMap<String, String>,
        email: &str,
    ) -> Result<Option<String>, StoreError> {
        if let Some(id) = index.get(email) {
            if self.load(id).await?.is_some_and(|u| u.email == email) {
                return Ok(Some(id.clone()));
            }
        }
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|u| u.email == email)
            .map(|u| u.id))
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.ensure_dirs()?;
        let index = self.load_index().await;
        match self.email_owner(&index, email).await? {
            Some(id) => self.load(&id).await,
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.load(id).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_dirs()?;
        let mut index = self.load_index().await;
        if self.email_owner(&index, &user.email).await?.is_some() {
            return Err(StoreError::Duplicate(user.email));
        }
        self.persist(&user).await?;
        index.insert(user.email.clone(), user.id.clone());
        self.sync_index(&index).await;
        Ok(user)
    }

    #[instrument(skip(self, patch))]
    async fn update_fields(&self, id: &str, patch: UserPatch) -> Result<User, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut user = self
            .load(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut index = self.load_index().await;
        if let Some(email) = patch.email.as_deref() {
            if let Some(owner) = self.email_owner(&index, email).await? {
                if owner != id {
                    return Err(StoreError::Duplicate(email.to_string()));
                }
            }
        }
        let old_email = user.email.clone();
        patch.apply(&mut user);
        self.persist(&user).await?;
        if old_email != user.email {
            index.remove(&old_email);
            index.insert(user.email.clone(), user.id.clone());
            self.sync_index(&index).await;
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self
            .user_path(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tokio::fs::remove_file(&path).await?;
        let mut index = self.load_index().await;
        index.retain(|_, uid| uid != id);
        self.sync_index(&index).await;
        Ok(())
    }

    async fn count_matching(&self, filter: &UserFilter) -> Result<u64, StoreError> {
        let users = self.load_all().await?;
        Ok(users.iter().filter(|u| filter.matches(u)).count() as u64)
    }

    async fn find_matching(
        &self,
        filter: &UserFilter,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<User>, StoreError> {
        let users = self.load_all().await?;
        Ok(select_page(users, filter, sort, skip, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::testing::{sample_users, user};
    use crate::user::{SearchSpec, SortOrder, UserField};
    use tempfile::TempDir;

    #[tokio::test]
    async fn insert_and_find() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.insert(user("a1", "Acep", "acep@test.com")).await.unwrap();

        let by_email = store.find_by_email("acep@test.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, "a1");
        let by_id = store.find_by_id("a1").await.unwrap().unwrap();
        assert_eq!(by_id.name, "Acep");
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.insert(user("a1", "Acep", "acep@test.com")).await.unwrap();
        let err = store
            .insert(user("a2", "Acep Lagi", "acep@test.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn path_like_ids_are_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.find_by_id("../index").await.unwrap().is_none());
        assert!(store.delete_by_id("../index").await.is_err());
    }

    #[tokio::test]
    async fn email_change_moves_index_entry() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.insert(user("b1", "Bob", "bob@test.com")).await.unwrap();

        let patch = UserPatch {
            email: Some("bobby@test.com".into()),
            ..Default::default()
        };
        store.update_fields("b1", patch).await.unwrap();

        assert!(store.find_by_email("bob@test.com").await.unwrap().is_none());
        let moved = store.find_by_email("bobby@test.com").await.unwrap().unwrap();
        assert_eq!(moved.id, "b1");
    }

    #[tokio::test]
    async fn delete_removes_file_and_index() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.insert(user("c1", "Charlie", "charlie@example.com")).await.unwrap();
        store.delete_by_id("c1").await.unwrap();
        assert!(store.find_by_email("charlie@example.com").await.unwrap().is_none());
        let err = store.delete_by_id("c1").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn unwritable_index_does_not_fail_completed_writes() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.ensure_dirs().unwrap();
        // 目录占住 index.json，索引无法写入
        std::fs::create_dir(dir.path().join("users").join("index.json")).unwrap();

        store.insert(user("d1", "Dadang", "dadang@example.com")).await.unwrap();
        let found = store.find_by_email("dadang@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, "d1");

        store.delete_by_id("d1").await.unwrap();
        assert!(store.find_by_id("d1").await.unwrap().is_none());
        assert!(store.find_by_email("dadang@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_and_sort_over_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        for u in sample_users() {
            store.insert(u).await.unwrap();
        }
        let filter = UserFilter {
            search: Some(SearchSpec::new(UserField::Email, "test")),
        };
        let sort = SortSpec::new(UserField::Email, SortOrder::Desc);
        assert_eq!(store.count_matching(&filter).await.unwrap(), 3);
        let users = store.find_matching(&filter, &sort, 0, 10).await.unwrap();
        let emails: Vec<_> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(
            emails,
            vec!["eveline@test.com", "bob@test.com", "acep@test.com"]
        );
    }
}
