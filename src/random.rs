//! 安全随机数生成模块
//!
//! 提供验证码、身份 ID 的随机生成，以及用于比较验证码的常量时间比较。

use rand::{Rng, TryRngCore, rngs::OsRng};

use crate::error::{CryptoError, Error, Result};

/// 验证码下界（包含）
pub const CODE_MIN: u32 = 100_000;

/// 验证码上界（包含）
pub const CODE_MAX: u32 = 999_999;

/// 生成指定长度的随机字节数组
///
/// 使用操作系统提供的密码学安全随机数生成器 (CSPRNG)
///
/// # Example
///
/// ```rust
/// use login_code::random::generate_random_bytes;
///
/// let bytes = generate_random_bytes(12).unwrap();
/// assert_eq!(bytes.len(), 12);
/// ```
pub fn generate_random_bytes(length: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Crypto(CryptoError::RngFailed(format!("{:?}", e))))?;
    Ok(bytes)
}

/// 生成指定长度的十六进制随机字符串
///
/// 最终字符串长度为字节数的两倍
pub fn generate_random_hex(byte_length: usize) -> Result<String> {
    let bytes = generate_random_bytes(byte_length)?;
    Ok(hex_encode(&bytes))
}

/// 生成身份记录 ID
///
/// 12 字节随机数，编码为 24 个小写十六进制字符。
///
/// ```rust
/// use login_code::random::generate_identity_id;
///
/// let id = generate_identity_id().unwrap();
/// assert_eq!(id.len(), 24);
/// ```
pub fn generate_identity_id() -> Result<String> {
    generate_random_hex(12)
}

/// 生成 6 位数字验证码
///
/// 在 [100000, 999999] 中均匀取值，直接以字符串返回，保持固定宽度。
///
/// ```rust
/// use login_code::random::generate_verification_code;
///
/// let code = generate_verification_code();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_digit()));
/// ```
pub fn generate_verification_code() -> String {
    generate_random_in_range(CODE_MIN as u64, CODE_MAX as u64 + 1).to_string()
}

/// 生成指定范围内的随机数
///
/// # Arguments
///
/// * `min` - 最小值（包含）
/// * `max` - 最大值（不包含）
pub fn generate_random_in_range(min: u64, max: u64) -> u64 {
    rand::rng().random_range(min..max)
}

// ============================================================================
// 辅助函数
// ============================================================================

/// 将字节数组编码为十六进制字符串
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// 常量时间比较两个字节切片
///
/// ```rust
/// use login_code::random::constant_time_compare;
///
/// assert!(constant_time_compare(b"482913", b"482913"));
/// assert!(!constant_time_compare(b"482913", b"482914"));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

/// 常量时间比较两个字符串
///
/// 长度不同直接判为不等，不做任何数值归一化。
pub fn constant_time_compare_str(a: &str, b: &str) -> bool {
    constant_time_compare(a.as_bytes(), b.as_bytes())
}
