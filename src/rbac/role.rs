//! 角色定义

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

use super::Capability;

/// 用户角色
///
/// 新建身份默认为 [`Role::User`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 普通学员
    #[default]
    User,
    /// 管理员，可以维护模块、课程和视频
    Admin,
}

impl Role {
    /// 角色的存储名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// 该角色拥有的全部能力
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::User => &[Capability::ViewCatalog, Capability::WatchVideos],
            Role::Admin => Capability::ALL,
        }
    }

    /// 检查是否拥有某项能力
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// 是否为管理员
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(Error::validation(format!("unknown role: {}", other))),
        }
    }
}
