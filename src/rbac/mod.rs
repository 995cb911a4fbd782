//! # 角色与能力检查
//!
//! 目录中所有会修改数据的操作（模块、课程、视频的增删改，以及用户角色变更）
//! 都通过同一个 [`authorize`] 判断，不在各个调用点重复比较角色字符串。
//!
//! ```rust
//! use login_code::rbac::{authorize, Capability, Role};
//!
//! assert!(authorize(Role::Admin, Capability::ManageCourses));
//! assert!(authorize(Role::User, Capability::WatchVideos));
//! assert!(!authorize(Role::User, Capability::ManageVideos));
//! ```

mod role;

pub use role::Role;

use serde::{Deserialize, Serialize};
use std::fmt;

/// 能力（某类操作的许可）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// 浏览模块与课程列表
    ViewCatalog,
    /// 观看视频
    WatchVideos,
    /// 创建、修改、删除模块
    ManageModules,
    /// 创建、修改、删除课程
    ManageCourses,
    /// 创建、修改、删除视频
    ManageVideos,
    /// 修改其他用户的角色
    ManageUsers,
}

impl Capability {
    /// 全部能力
    pub const ALL: &'static [Capability] = &[
        Capability::ViewCatalog,
        Capability::WatchVideos,
        Capability::ManageModules,
        Capability::ManageCourses,
        Capability::ManageVideos,
        Capability::ManageUsers,
    ];

    /// 是否是写操作
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Capability::ViewCatalog | Capability::WatchVideos)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ViewCatalog => write!(f, "view_catalog"),
            Capability::WatchVideos => write!(f, "watch_videos"),
            Capability::ManageModules => write!(f, "manage_modules"),
            Capability::ManageCourses => write!(f, "manage_courses"),
            Capability::ManageVideos => write!(f, "manage_videos"),
            Capability::ManageUsers => write!(f, "manage_users"),
        }
    }
}

/// 判断角色是否拥有所需能力
pub fn authorize(role: Role, required: Capability) -> bool {
    role.has_capability(required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_everything() {
        for capability in Capability::ALL {
            assert!(authorize(Role::Admin, *capability));
        }
    }

    #[test]
    fn test_user_cannot_mutate() {
        for capability in Capability::ALL {
            assert_eq!(authorize(Role::User, *capability), !capability.is_mutating());
        }
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::ManageVideos.to_string(), "manage_videos");
    }
}
