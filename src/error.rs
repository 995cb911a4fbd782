//! 统一错误类型模块
//!
//! 提供 login-code 库中所有操作的错误类型定义，以及面向调用方的失败分类。

use std::fmt;

use serde::Serialize;

/// login-code 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// login-code 库的错误类型
#[derive(Debug)]
pub enum Error {
    /// 登录验证码相关错误
    Login(LoginError),

    /// 投递通道错误
    Delivery(DeliveryError),

    /// 存储错误
    Storage(StorageError),

    /// 输入验证错误
    Validation(ValidationError),

    /// 配置错误
    Config(ConfigError),

    /// 随机数错误
    Crypto(CryptoError),

    /// 内部错误
    Internal(String),
}

impl Error {
    /// 创建一个内部错误
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// 创建一个验证错误
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(ValidationError::Custom(msg.into()))
    }

    /// 创建一个存储不可用错误
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Error::Storage(StorageError::Unavailable(msg.into()))
    }

    /// 创建一个投递失败错误
    pub fn delivery_failed(msg: impl Into<String>) -> Self {
        Error::Delivery(DeliveryError::Failed(msg.into()))
    }

    /// 映射到面向调用方的失败分类
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Login(LoginError::IdentityNotFound) => FailureKind::NotFound,
            Error::Login(LoginError::InvalidCode) => FailureKind::InvalidCode,
            Error::Login(LoginError::Expired) => FailureKind::Expired,
            Error::Delivery(_) => FailureKind::DeliveryFailed,
            Error::Storage(StorageError::Unavailable(_)) => FailureKind::StoreUnavailable,
            Error::Storage(StorageError::NotFound(_)) => FailureKind::NotFound,
            Error::Validation(_) => FailureKind::InvalidInput,
            Error::Storage(_) | Error::Config(_) | Error::Crypto(_) | Error::Internal(_) => {
                FailureKind::Internal
            }
        }
    }

    /// 是否是基础设施故障（存储或投递），而非用户输入问题
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self.failure_kind(),
            FailureKind::StoreUnavailable | FailureKind::DeliveryFailed | FailureKind::Internal
        )
    }
}

/// 登录验证码相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// 邮箱没有对应的身份记录
    IdentityNotFound,
    /// 验证码不匹配或当前没有待验证的验证码
    InvalidCode,
    /// 验证码匹配但已过期
    Expired,
}

/// 投递通道相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// 投递失败
    Failed(String),
    /// 收件或发件地址无效
    InvalidAddress(String),
    /// 投递超时
    Timeout,
}

/// 存储相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// 存储不可达（连接失败、已关闭、超时）
    Unavailable(String),
    /// 记录未找到
    NotFound(String),
    /// 记录已存在
    AlreadyExists(String),
    /// 操作失败
    OperationFailed(String),
}

/// 输入验证相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 字段为空
    EmptyField(String),
    /// 自定义验证错误
    Custom(String),
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 缺少必需的配置
    MissingRequired(String),
    /// 无效的配置值
    InvalidValue { key: String, message: String },
}

/// 随机数相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// 随机数生成失败
    RngFailed(String),
}

// ============================================================================
// 面向调用方的失败分类
// ============================================================================

/// 调用方可见的失败分类
///
/// HTTP 层据此选择状态码；`StoreUnavailable` 与 `InvalidCode` 必须区分，
/// 不能把基础设施故障告诉用户成"验证码错误"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 请求缺少必填字段
    InvalidInput,
    /// 身份记录不存在
    NotFound,
    /// 验证码无效
    InvalidCode,
    /// 验证码已过期
    Expired,
    /// 投递失败
    DeliveryFailed,
    /// 存储不可用
    StoreUnavailable,
    /// 其他内部错误
    Internal,
}

impl FailureKind {
    /// 简短、非技术性的用户提示
    pub fn public_message(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "Missing required fields",
            FailureKind::NotFound => "User not found",
            FailureKind::InvalidCode | FailureKind::Expired => "Invalid or expired code",
            FailureKind::DeliveryFailed => "Could not send the verification code by email",
            FailureKind::StoreUnavailable => {
                "Service temporarily unavailable, please try again later"
            }
            FailureKind::Internal => "Internal server error",
        }
    }

    /// 建议的 HTTP 状态码
    pub fn http_status(&self) -> u16 {
        match self {
            FailureKind::InvalidInput
            | FailureKind::NotFound
            | FailureKind::InvalidCode
            | FailureKind::Expired
            | FailureKind::DeliveryFailed => 400,
            FailureKind::StoreUnavailable => 503,
            FailureKind::Internal => 500,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::NotFound => "not_found",
            FailureKind::InvalidCode => "invalid_code",
            FailureKind::Expired => "expired",
            FailureKind::DeliveryFailed => "delivery_failed",
            FailureKind::StoreUnavailable => "store_unavailable",
            FailureKind::Internal => "internal",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Login(e) => write!(f, "Login error: {}", e),
            Error::Delivery(e) => write!(f, "Delivery error: {}", e),
            Error::Storage(e) => write!(f, "Storage error: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Config(e) => write!(f, "Config error: {}", e),
            Error::Crypto(e) => write!(f, "Crypto error: {}", e),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginError::IdentityNotFound => write!(f, "no identity for this email"),
            LoginError::InvalidCode => write!(f, "invalid verification code"),
            LoginError::Expired => write!(f, "verification code has expired"),
        }
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Failed(msg) => write!(f, "delivery failed: {}", msg),
            DeliveryError::InvalidAddress(addr) => write!(f, "invalid address: {}", addr),
            DeliveryError::Timeout => write!(f, "delivery timed out"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
            StorageError::NotFound(item) => write!(f, "not found: {}", item),
            StorageError::AlreadyExists(item) => write!(f, "already exists: {}", item),
            StorageError::OperationFailed(msg) => write!(f, "storage operation failed: {}", msg),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "field '{}' cannot be empty", field),
            ValidationError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(key) => {
                write!(f, "missing required configuration: {}", key)
            }
            ConfigError::InvalidValue { key, message } => {
                write!(f, "invalid configuration value for '{}': {}", key, message)
            }
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::RngFailed(msg) => write!(f, "random number generation failed: {}", msg),
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Login(e) => Some(e),
            Error::Delivery(e) => Some(e),
            Error::Storage(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Crypto(e) => Some(e),
            Error::Internal(_) => None,
        }
    }
}

impl std::error::Error for LoginError {}
impl std::error::Error for DeliveryError {}
impl std::error::Error for StorageError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for CryptoError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<LoginError> for Error {
    fn from(err: LoginError) -> Self {
        Error::Login(err)
    }
}

impl From<DeliveryError> for Error {
    fn from(err: DeliveryError) -> Self {
        Error::Delivery(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::Crypto(err)
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Error::Storage(StorageError::Unavailable(err.to_string())),
            sqlx::Error::RowNotFound => Error::Storage(StorageError::NotFound(err.to_string())),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::Storage(StorageError::AlreadyExists(err.to_string()))
            }
            other => Error::Storage(StorageError::OperationFailed(other.to_string())),
        }
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::address::AddressError> for Error {
    fn from(err: lettre::address::AddressError) -> Self {
        Error::Delivery(DeliveryError::InvalidAddress(err.to_string()))
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::error::Error> for Error {
    fn from(err: lettre::error::Error) -> Self {
        Error::Delivery(DeliveryError::Failed(err.to_string()))
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::transport::smtp::Error> for Error {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Error::Delivery(DeliveryError::Failed(err.to_string()))
    }
}
