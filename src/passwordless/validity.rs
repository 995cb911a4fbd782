//! 验证码有效性判断
//!
//! 纯函数，不读时钟也不碰存储，便于精确测试过期边界。

use chrono::{DateTime, Utc};

use crate::identity::PendingCode;
use crate::random::constant_time_compare_str;

/// 默认有效期（毫秒），边界包含在内
pub const CODE_TTL_MS: i64 = 600_000;

/// 验证码检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// 匹配且未过期
    Valid,
    /// 存储的验证码、签发时间或候选值缺失
    Missing,
    /// 不匹配
    Mismatch,
    /// 匹配但已过期
    Expired,
}

impl CodeCheck {
    /// 是否有效
    pub fn is_valid(&self) -> bool {
        matches!(self, CodeCheck::Valid)
    }
}

/// 检查候选验证码
///
/// 空字符串视为缺失。比较是精确的字符串比较，`"004521"` 与 `"4521"` 不相等。
/// `now - issued_at <= ttl_ms` 时未过期。
pub fn check_code(
    stored_code: Option<&str>,
    issued_at: Option<DateTime<Utc>>,
    candidate: Option<&str>,
    now: DateTime<Utc>,
    ttl_ms: i64,
) -> CodeCheck {
    let (Some(stored), Some(issued_at), Some(candidate)) = (
        stored_code.filter(|c| !c.is_empty()),
        issued_at,
        candidate.filter(|c| !c.is_empty()),
    ) else {
        return CodeCheck::Missing;
    };

    if !constant_time_compare_str(stored, candidate) {
        return CodeCheck::Mismatch;
    }

    if (now - issued_at).num_milliseconds() > ttl_ms {
        return CodeCheck::Expired;
    }

    CodeCheck::Valid
}

/// 对待验证码执行检查
pub fn check_pending(
    pending: Option<&PendingCode>,
    candidate: &str,
    now: DateTime<Utc>,
    ttl_ms: i64,
) -> CodeCheck {
    check_code(
        pending.map(|p| p.code.as_str()),
        pending.map(|p| p.issued_at),
        Some(candidate),
        now,
        ttl_ms,
    )
}

/// 验证码是否有效（默认 10 分钟有效期）
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use login_code::passwordless::is_code_valid;
///
/// let issued = Utc::now();
/// let now = issued + Duration::milliseconds(600_000);
/// assert!(is_code_valid(Some("123456"), Some(issued), Some("123456"), now));
/// assert!(!is_code_valid(Some("123456"), Some(issued), Some("654321"), now));
/// ```
pub fn is_code_valid(
    stored_code: Option<&str>,
    issued_at: Option<DateTime<Utc>>,
    candidate: Option<&str>,
    now: DateTime<Utc>,
) -> bool {
    check_code(stored_code, issued_at, candidate, now, CODE_TTL_MS).is_valid()
}
