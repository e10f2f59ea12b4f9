//! Shared fixtures for unit tests.

use super::attempts::Clock;
use super::crypto::PasswordHasher;
use super::models::User;
use crate::error::HashError;
use crate::store::{CredentialStore, MemoryStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) fn user(id: &str, name: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn sample_users() -> Vec<User> {
    vec![
        user("1", "Johni", "johni@example.com"),
        user("2", "Hana", "hana@example.com"),
        user("3", "Dadang", "dadang@example.com"),
        user("4", "Acep", "acep@test.com"),
        user("5", "Bob", "bob@test.com"),
        user("6", "Charlie", "charlie@example.com"),
        user("7", "Eveline", "eveline@test.com"),
        user("8", "Jack", "jack@example.com"),
    ]
}

/// Memory store holding the sample users, all sharing one password.
pub(crate) async fn seeded_store(hasher: &dyn PasswordHasher, password: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let hash = hasher.hash(password).await.unwrap();
    for mut u in sample_users() {
        u.password_hash = hash.clone();
        store.insert(u).await.unwrap();
    }
    store
}

#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Plain-text hasher that counts calls to `hash`.
#[derive(Debug, Default)]
pub(crate) struct CountingHasher {
    pub(crate) hash_calls: AtomicUsize,
}

impl CountingHasher {
    pub(crate) fn hash_calls(&self) -> usize {
        self.hash_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PasswordHasher for CountingHasher {
    async fn hash(&self, password: &str) -> Result<String, HashError> {
        self.hash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("plain:{password}"))
    }

    async fn matches(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        Ok(hash == format!("plain:{password}"))
    }
}
