use super::{select_page, CredentialStore, UserFilter};
use crate::error::StoreError;
use crate::user::{SortSpec, User, UserPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process store keyed by user id. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<String, User>, email: &str, except_id: &str) -> bool {
    users
        .values()
        .any(|u| u.email == email && u.id != except_id)
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, &user.id) {
            return Err(StoreError::Duplicate(user.email));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_fields(&self, id: &str, patch: UserPatch) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if let Some(email) = patch.email.as_deref() {
            if email_taken(&users, email, id) {
                return Err(StoreError::Duplicate(email.to_string()));
            }
        }
        let user = users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(user);
        Ok(user.clone())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn count_matching(&self, filter: &UserFilter) -> Result<u64, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).count() as u64)
    }

    async fn find_matching(
        &self,
        filter: &UserFilter,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(select_page(users.values().cloned(), filter, sort, skip, limit))
    }
}
