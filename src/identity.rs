//! 身份记录
//!
//! 身份以邮箱为自然键。待验证的验证码与其签发时间合并为一个
//! [`PendingCode`]，两者只能同时存在或同时缺失。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::random::generate_identity_id;
use crate::rbac::Role;

/// 待验证的验证码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCode {
    /// 6 位数字验证码
    pub code: String,

    /// 签发时间（毫秒精度）
    pub issued_at: DateTime<Utc>,
}

impl PendingCode {
    /// 创建待验证码
    pub fn new(code: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            issued_at,
        }
    }
}

/// 身份记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// 生成的身份 ID，用于会话恢复
    pub id: String,

    /// 邮箱（唯一）
    pub email: String,

    /// 显示名
    pub name: String,

    /// 角色
    pub role: Role,

    /// 当前待验证的验证码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_code: Option<PendingCode>,

    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl IdentityRecord {
    /// 为首次登录的邮箱创建新记录
    ///
    /// 显示名取邮箱的本地部分，角色为 `user`。
    pub fn new_for_email(email: impl Into<String>, created_at: DateTime<Utc>) -> Result<Self> {
        let email = email.into();
        Ok(Self {
            id: generate_identity_id()?,
            name: default_name_for(&email),
            email,
            role: Role::default(),
            pending_code: None,
            created_at,
        })
    }

    /// 是否有待验证的验证码
    pub fn has_pending_code(&self) -> bool {
        self.pending_code.is_some()
    }

    /// 公开投影
    pub fn public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// 对外返回的身份信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// 由邮箱推导默认显示名
///
/// ```rust
/// use login_code::identity::default_name_for;
///
/// assert_eq!(default_name_for("new@x.com"), "new");
/// assert_eq!(default_name_for("no-at-sign"), "no-at-sign");
/// ```
pub fn default_name_for(email: &str) -> String {
    match email.split_once('@') {
        Some((local, _)) if !local.is_empty() => local.to_string(),
        _ => email.to_string(),
    }
}
