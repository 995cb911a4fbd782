//! # login-code
//!
//! 基于邮箱一次性验证码的无密码登录库。
//!
//! ## 功能特性
//!
//! - **验证码签发**: 首次请求时自动创建身份，生成 6 位数字验证码并投递
//! - **验证码验证**: 10 分钟有效期（包含边界），验证成功后立即失效
//! - **身份存储**: 可注入的异步存储接口，提供内存和 SQLite 实现
//! - **投递通道**: SMTP（MailHog / Resend）、日志、内存通道
//! - **角色与能力**: `user` / `admin` 两种角色，集中的能力检查
//! - **审计日志**: 登录流程中的安全事件记录
//!
//! ## Features
//!
//! - `sqlite` - 启用基于 sqlx 的 SQLite 身份存储（默认启用）
//! - `smtp` - 启用基于 lettre 的 SMTP 投递（默认启用）
//! - `cli` - 构建 `login-code` 命令行工具
//!
//! ## 登录流程示例
//!
//! ```rust
//! use std::sync::Arc;
//! use login_code::delivery::MemoryOutbox;
//! use login_code::store::InMemoryIdentityStore;
//! use login_code::LoginCodeService;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let outbox = MemoryOutbox::new();
//! let service = LoginCodeService::new(
//!     Arc::new(InMemoryIdentityStore::new()),
//!     Arc::new(outbox.clone()),
//! );
//!
//! // 请求验证码
//! let response = service.request_login_code("ana@example.com").await;
//! assert!(response.success);
//!
//! // 使用收到的验证码登录
//! let code = outbox.last_code_for("ana@example.com").unwrap();
//! let response = service.verify_login_code("ana@example.com", &code).await;
//! assert_eq!(response.user.unwrap().name, "ana");
//!
//! // 验证码只能使用一次
//! let response = service.verify_login_code("ana@example.com", &code).await;
//! assert!(!response.success);
//! # }
//! ```
//!
//! ## 能力检查示例
//!
//! ```rust
//! use login_code::rbac::{authorize, Capability, Role};
//!
//! assert!(authorize(Role::User, Capability::WatchVideos));
//! assert!(!authorize(Role::User, Capability::ManageCourses));
//! assert!(authorize(Role::Admin, Capability::ManageCourses));
//! ```

pub mod audit;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod identity;
pub mod passwordless;
pub mod random;
pub mod rbac;
pub mod store;

pub use error::{Error, FailureKind, Result};

// ============================================================================
// 登录流程相关导出
// ============================================================================

pub use passwordless::{
    CodeCheck, CodeIssuer, CodeVerifier, IssuedCode, LoginCodeService, RequestCodeResponse,
    VerifyCodeResponse, check_code, is_code_valid,
};

// ============================================================================
// 身份与存储相关导出
// ============================================================================

pub use identity::{IdentityRecord, PendingCode, PublicIdentity};
#[cfg(feature = "sqlite")]
pub use store::SqliteIdentityStore;
pub use store::{IdentityStore, InMemoryIdentityStore, RoleChange};

// ============================================================================
// 配置与投递相关导出
// ============================================================================

pub use config::{LoginCodeConfig, MailerConfig, SmtpSecurity};
#[cfg(feature = "smtp")]
pub use delivery::SmtpDelivery;
pub use delivery::{CodePurpose, DeliveryChannel, LogDelivery, MemoryOutbox};

// ============================================================================
// 其它导出
// ============================================================================

pub use audit::{AuditLogger, InMemoryAuditLogger, NoOpAuditLogger, TracingAuditLogger};
pub use clock::{Clock, ManualClock, SystemClock};
pub use rbac::{Capability, Role, authorize};
