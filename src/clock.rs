//! 时钟抽象
//!
//! 签发与验证都通过 [`Clock`] 取当前时间，测试中可用 [`ManualClock`]
//! 精确控制过期边界。

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};

/// 时间来源
pub trait Clock: Send + Sync {
    /// 当前时间
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动时钟
///
/// 克隆体共享同一个时间点。
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// 从指定时间开始
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// 从当前系统时间（截断到毫秒）开始
    pub fn starting_now() -> Self {
        Self::new(truncate_to_millis(Utc::now()))
    }

    /// 前进一段时间
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    /// 设置为指定时间
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// 截断到毫秒精度
///
/// 所有存储都以毫秒保存签发时间，比较前必须先截断。
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}
