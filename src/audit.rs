//! 审计日志模块
//!
//! 记录登录验证码流程中的安全事件：
//!
//! - **安全事件**: 验证码签发、投递失败、验证成功/失败、身份创建、角色变更
//! - **审计日志 Trait**: 定义日志记录接口
//! - **实现**: 输出到 `tracing` 的默认实现、用于测试的内存实现、空实现
//!
//! ## 使用示例
//!
//! ```rust
//! use login_code::audit::{AuditLogger, InMemoryAuditLogger, SecurityEvent};
//!
//! let logger = InMemoryAuditLogger::new();
//! logger.log(SecurityEvent::code_issued("ana@example.com"));
//! logger.log(SecurityEvent::code_rejected("ana@example.com", "invalid_code"));
//!
//! assert_eq!(logger.get_events_by_recipient("ana@example.com").len(), 2);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// 事件严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EventSeverity {
    /// 一般信息
    #[default]
    Info,
    /// 警告
    Warning,
    /// 错误
    Error,
}

impl std::fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSeverity::Info => write!(f, "INFO"),
            EventSeverity::Warning => write!(f, "WARNING"),
            EventSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// 安全事件类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 验证码已签发并投递
    CodeIssued,
    /// 验证码已保存但投递失败
    CodeDeliveryFailed,
    /// 验证码验证成功（登录成功）
    CodeVerified,
    /// 验证码被拒绝
    CodeRejected,
    /// 首次登录时创建身份
    IdentityCreated,
    /// 角色变更
    RoleChanged,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::CodeIssued => write!(f, "code_issued"),
            EventType::CodeDeliveryFailed => write!(f, "code_delivery_failed"),
            EventType::CodeVerified => write!(f, "code_verified"),
            EventType::CodeRejected => write!(f, "code_rejected"),
            EventType::IdentityCreated => write!(f, "identity_created"),
            EventType::RoleChanged => write!(f, "role_changed"),
        }
    }
}

/// 安全事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// 事件 ID
    pub id: String,
    /// 事件类型
    pub event_type: EventType,
    /// 严重程度
    pub severity: EventSeverity,
    /// 相关邮箱
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// 身份 ID（如果已知）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// 事件消息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 额外详情
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
    /// 事件时间
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    /// 创建新的安全事件
    pub fn new(event_type: EventType, severity: EventSeverity) -> Self {
        Self {
            id: generate_event_id(),
            event_type,
            severity,
            recipient: None,
            user_id: None,
            message: None,
            details: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    // ========================================================================
    // 便捷构造方法
    // ========================================================================

    /// 验证码签发事件
    pub fn code_issued(recipient: impl Into<String>) -> Self {
        Self::new(EventType::CodeIssued, EventSeverity::Info)
            .with_recipient(recipient)
            .with_message("Verification code issued")
    }

    /// 投递失败事件
    pub fn code_delivery_failed(recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(EventType::CodeDeliveryFailed, EventSeverity::Error)
            .with_recipient(recipient)
            .with_message(format!("Verification code delivery failed: {}", reason.into()))
    }

    /// 验证成功事件
    pub fn code_verified(recipient: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::new(EventType::CodeVerified, EventSeverity::Info)
            .with_recipient(recipient)
            .with_user_id(user_id)
            .with_message("User logged in with verification code")
    }

    /// 验证失败事件
    pub fn code_rejected(recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(EventType::CodeRejected, EventSeverity::Warning)
            .with_recipient(recipient)
            .with_message(format!("Verification code rejected: {}", reason.into()))
    }

    /// 身份创建事件
    pub fn identity_created(recipient: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::new(EventType::IdentityCreated, EventSeverity::Info)
            .with_recipient(recipient)
            .with_user_id(user_id)
            .with_message("Identity created on first login request")
    }

    /// 角色变更事件
    pub fn role_changed(recipient: impl Into<String>, role: impl Into<String>) -> Self {
        let role = role.into();
        Self::new(EventType::RoleChanged, EventSeverity::Warning)
            .with_recipient(recipient)
            .with_detail("role", role.clone())
            .with_message(format!("Role changed to {}", role))
    }

    // ========================================================================
    // Builder 方法
    // ========================================================================

    /// 设置邮箱
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// 设置身份 ID
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// 设置消息
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 添加详情
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// 获取事件类型名称
    pub fn event_name(&self) -> String {
        self.event_type.to_string()
    }
}

/// 生成事件 ID
fn generate_event_id() -> String {
    use crate::random::generate_random_hex;
    format!(
        "evt_{}",
        generate_random_hex(16).unwrap_or_else(|_| "unknown".to_string())
    )
}

// ============================================================================
// AuditLogger Trait
// ============================================================================

/// 审计日志记录器 trait
pub trait AuditLogger: Send + Sync {
    /// 记录安全事件
    fn log(&self, event: SecurityEvent);
}

// ============================================================================
// TracingAuditLogger
// ============================================================================

/// 输出到 `tracing` 的审计日志记录器
///
/// 事件以 `audit` target 输出，严重程度映射为日志级别。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

impl TracingAuditLogger {
    /// 创建记录器
    pub fn new() -> Self {
        Self
    }
}

impl AuditLogger for TracingAuditLogger {
    fn log(&self, event: SecurityEvent) {
        let recipient = event.recipient.as_deref().unwrap_or("-");
        let user_id = event.user_id.as_deref().unwrap_or("-");
        let message = event.message.as_deref().unwrap_or("");
        match event.severity {
            EventSeverity::Info => tracing::info!(
                target: "audit",
                event_id = %event.id,
                event = %event.event_type,
                recipient = %recipient,
                user_id = %user_id,
                "{}",
                message
            ),
            EventSeverity::Warning => tracing::warn!(
                target: "audit",
                event_id = %event.id,
                event = %event.event_type,
                recipient = %recipient,
                user_id = %user_id,
                "{}",
                message
            ),
            EventSeverity::Error => tracing::error!(
                target: "audit",
                event_id = %event.id,
                event = %event.event_type,
                recipient = %recipient,
                user_id = %user_id,
                "{}",
                message
            ),
        }
    }
}

// ============================================================================
// InMemoryAuditLogger
// ============================================================================

/// 内存审计日志记录器
///
/// 用于测试和开发环境，将事件存储在内存中
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuditLogger {
    events: Arc<RwLock<Vec<SecurityEvent>>>,
}

impl InMemoryAuditLogger {
    /// 创建新的内存日志记录器
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取所有事件
    pub fn get_events(&self) -> Vec<SecurityEvent> {
        self.events.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 获取事件数量
    pub fn event_count(&self) -> usize {
        self.events.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 按邮箱获取事件
    pub fn get_events_by_recipient(&self, recipient: &str) -> Vec<SecurityEvent> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.recipient.as_deref() == Some(recipient))
            .cloned()
            .collect()
    }

    /// 按事件类型获取事件
    pub fn get_events_by_type(&self, event_type: &EventType) -> Vec<SecurityEvent> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| &e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// 清空所有事件
    pub fn clear(&self) {
        self.events.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl AuditLogger for InMemoryAuditLogger {
    fn log(&self, event: SecurityEvent) {
        self.events
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

// ============================================================================
// NoOpAuditLogger
// ============================================================================

/// 空操作日志记录器
///
/// 不执行任何操作，用于禁用审计日志
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditLogger;

impl AuditLogger for NoOpAuditLogger {
    fn log(&self, _event: SecurityEvent) {}
}

// ============================================================================
// 测试
// ============================================================================
