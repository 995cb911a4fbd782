//! 身份存储
//!
//! 签发器和验证器只通过 [`IdentityStore`] 访问身份记录，存储在构造时注入，
//! 并有显式的 `open` / `close` 生命周期。
//!
//! ## 原子性要求
//!
//! [`IdentityStore::clear_pending_code_if`] 必须是一次条件写：只有当前存储的
//! 验证码和签发时间仍等于期望值时才清除。并发验证同一个验证码时，
//! 最多只有一个调用能看到 `true`。

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryIdentityStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIdentityStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::{IdentityRecord, PendingCode};
use crate::rbac::Role;

/// 角色变更结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    /// 邮箱没有对应记录
    NotFound,
    /// 角色本来就是目标值
    Unchanged,
    /// 角色已更新
    Changed,
}

/// 身份存储接口
///
/// 实现此 trait 以提供自定义的存储后端（如数据库、文档库等）
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// 打开存储（建立连接、准备表结构）
    async fn open(&self) -> Result<()>;

    /// 关闭存储
    async fn close(&self) -> Result<()>;

    /// 按邮箱查找
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>>;

    /// 按身份 ID 查找
    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>>;

    /// 邮箱不存在时插入记录
    ///
    /// 返回 `true` 表示本次插入了新记录；邮箱已存在时不做修改并返回 `false`。
    async fn insert_if_absent(&self, record: &IdentityRecord) -> Result<bool>;

    /// 设置待验证码，覆盖之前的验证码
    ///
    /// 返回 `false` 表示邮箱没有对应记录。
    async fn set_pending_code(&self, email: &str, pending: &PendingCode) -> Result<bool>;

    /// 条件清除待验证码
    ///
    /// 仅当当前待验证码与 `expected` 完全相同（验证码和签发时间）时清除并返回 `true`。
    async fn clear_pending_code_if(&self, email: &str, expected: &PendingCode) -> Result<bool>;

    /// 修改角色
    async fn set_role(&self, email: &str, role: Role) -> Result<RoleChange>;
}
