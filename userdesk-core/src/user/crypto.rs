//! 密码加密工具

use crate::error::HashError;
use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};

/// 密码哈希与校验
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, HashError>;

    async fn matches(&self, password: &str, hash: &str) -> Result<bool, HashError>;
}

/// bcrypt 实现（在阻塞线程中执行）
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl BcryptHasher {
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> Result<String, HashError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| HashError(format!("spawn_blocking failed: {}", e)))?
            .map_err(|e| HashError(format!("bcrypt hash failed: {}", e)))
    }

    async fn matches(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify(&password, &hash))
            .await
            .map_err(|e| HashError(format!("spawn_blocking failed: {}", e)))?
            .map_err(|e| HashError(format!("bcrypt verify failed: {}", e)))
    }
}
