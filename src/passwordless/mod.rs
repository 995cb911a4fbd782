//! 邮箱验证码登录模块
//!
//! 提供基于一次性 6 位数字验证码的无密码登录：
//!
//! - **签发**: [`CodeIssuer`] 确保身份存在、生成验证码并投递
//! - **验证**: [`CodeVerifier`] 检查验证码并以条件写消费它
//! - **有效性**: [`check_code`] / [`is_code_valid`] 纯函数，便于测试过期边界
//! - **服务**: [`LoginCodeService`] 组合以上组件，返回面向调用方的响应
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use login_code::delivery::MemoryOutbox;
//! use login_code::passwordless::LoginCodeService;
//! use login_code::store::InMemoryIdentityStore;
//!
//! # async fn example() {
//! let outbox = MemoryOutbox::new();
//! let service = LoginCodeService::new(
//!     Arc::new(InMemoryIdentityStore::new()),
//!     Arc::new(outbox.clone()),
//! );
//!
//! service.request_login_code("ana@example.com").await;
//! let code = outbox.last_code_for("ana@example.com").unwrap();
//!
//! let response = service.verify_login_code("ana@example.com", &code).await;
//! assert!(response.success);
//! # }
//! ```

mod issuer;
mod response;
mod service;
mod validity;
mod verifier;

pub use issuer::{CodeIssuer, IssuedCode};
pub use response::{RequestCodeResponse, VerifyCodeResponse};
pub use service::{EMAIL_AND_CODE_REQUIRED, EMAIL_REQUIRED, LoginCodeService};
pub use validity::{CODE_TTL_MS, CodeCheck, check_code, check_pending, is_code_valid};
pub use verifier::CodeVerifier;

use std::future::Future;
use std::time::Duration;

use crate::error::{DeliveryError, Error, Result};

/// 为存储调用加上超时，超时视为存储不可用
pub(crate) async fn store_call<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::store_unavailable(format!(
            "{} timed out after {:?}",
            operation, limit
        ))),
    }
}

/// 为投递调用加上超时
pub(crate) async fn delivery_call(
    limit: Duration,
    fut: impl Future<Output = Result<()>>,
) -> Result<()> {
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or(Err(DeliveryError::Timeout.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[tokio::test]
    async fn test_store_call_timeout() {
        let err = store_call(Duration::from_millis(5), "slow", async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::StoreUnavailable);
    }

    #[tokio::test]
    async fn test_delivery_call_timeout() {
        let err = delivery_call(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Delivery(DeliveryError::Timeout)));
    }

    #[tokio::test]
    async fn test_calls_pass_through() {
        assert_eq!(
            store_call(Duration::from_secs(1), "fast", async { Ok(7) })
                .await
                .unwrap(),
            7
        );
        assert!(
            delivery_call(Duration::from_secs(1), async { Ok(()) })
                .await
                .is_ok()
        );
    }
}
