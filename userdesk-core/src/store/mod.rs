//! Credential storage: the persisted user collection behind a trait, with an
//! in-memory backend and a JSON-file backend.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::user::{ListQuery, SearchSpec, SortSpec, User, UserPatch};
use async_trait::async_trait;

/// Filter applied before counting and paging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub search: Option<SearchSpec>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.search.as_ref().map_or(true, |s| s.matches(user))
    }
}

impl From<&ListQuery> for UserFilter {
    fn from(query: &ListQuery) -> Self {
        Self {
            search: query.search.clone(),
        }
    }
}

/// The persisted user collection.
///
/// Emails are unique: `insert` and `update_fields` fail with
/// [`StoreError::Duplicate`] when another record already owns the email.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: User) -> Result<User, StoreError>;

    async fn update_fields(&self, id: &str, patch: UserPatch) -> Result<User, StoreError>;

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;

    async fn count_matching(&self, filter: &UserFilter) -> Result<u64, StoreError>;

    async fn find_matching(
        &self,
        filter: &UserFilter,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<User>, StoreError>;
}

/// Filter, sort and slice an in-process snapshot of the collection.
pub(crate) fn select_page(
    users: impl IntoIterator<Item = User>,
    filter: &UserFilter,
    sort: &SortSpec,
    skip: u64,
    limit: u64,
) -> Vec<User> {
    let mut matched: Vec<User> = users.into_iter().filter(|u| filter.matches(u)).collect();
    matched.sort_by(|a, b| sort.compare(a, b));
    matched
        .into_iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}
