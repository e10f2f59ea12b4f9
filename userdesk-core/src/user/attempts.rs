//! 登录尝试计数：按 email 记录次数，超过窗口期后重新计数

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 默认窗口：距离上一次尝试超过 30 分钟则重置计数
pub fn default_window() -> Duration {
    Duration::minutes(30)
}

/// 时间来源，测试中可替换
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 单个 email 的尝试记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub count: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// 登录尝试记录存储
#[async_trait]
pub trait AttemptTracker: Send + Sync {
    /// 记录一次尝试，返回累加后的次数
    async fn record_attempt(&self, email: &str) -> u32;

    async fn info(&self, email: &str) -> Option<AttemptRecord>;

    /// 删除记录（而不是清零）
    async fn clear(&self, email: &str);
}

/// 进程内的尝试记录，每个 email 至多一条
#[derive(Debug)]
pub struct MemoryAttemptTracker {
    window: Duration,
    clock: Arc<dyn Clock>,
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl Default for MemoryAttemptTracker {
    fn default() -> Self {
        Self::new(default_window())
    }
}

impl MemoryAttemptTracker {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(SystemClock))
    }

    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[async_trait]
impl AttemptTracker for MemoryAttemptTracker {
    async fn record_attempt(&self, email: &str) -> u32 {
        let now = self.clock.now();
        let mut records = self.records.lock().await;
        let record = records.entry(email.to_string()).or_insert(AttemptRecord {
            count: 0,
            last_attempt_at: None,
        });
        // 以上一次尝试时间判断是否过期；首次尝试不会触发重置
        if let Some(last) = record.last_attempt_at {
            if now - last > self.window {
                record.count = 0;
            }
        }
        record.last_attempt_at = Some(now);
        record.count = record.count.saturating_add(1);
        record.count
    }

    async fn info(&self, email: &str) -> Option<AttemptRecord> {
        self.records.lock().await.get(email).copied()
    }

    async fn clear(&self, email: &str) {
        self.records.lock().await.remove(email);
    }
}
