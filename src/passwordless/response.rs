//! 调用方响应

use serde::{Deserialize, Serialize};

use crate::error::FailureKind;
use crate::identity::PublicIdentity;

/// 请求验证码的响应
///
/// 序列化为 `{success, message}` 或 `{success: false, error}`；
/// `failure` 不参与序列化，供 HTTP 层选择状态码。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCodeResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl RequestCodeResponse {
    /// 成功
    pub fn sent(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            failure: None,
        }
    }

    /// 失败，使用分类的默认提示
    pub fn failed(kind: FailureKind) -> Self {
        Self::failed_with(kind, kind.public_message())
    }

    /// 失败，使用自定义提示
    pub fn failed_with(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            failure: Some(kind),
        }
    }
}

/// 验证验证码的响应
///
/// 序列化为 `{success, user}` 或 `{success: false, error}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicIdentity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl VerifyCodeResponse {
    /// 登录成功
    pub fn logged_in(user: PublicIdentity) -> Self {
        Self {
            success: true,
            user: Some(user),
            error: None,
            failure: None,
        }
    }

    /// 失败，使用分类的默认提示
    pub fn failed(kind: FailureKind) -> Self {
        Self::failed_with(kind, kind.public_message())
    }

    /// 失败，使用自定义提示
    pub fn failed_with(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            error: Some(error.into()),
            failure: Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::Role;

    #[test]
    fn test_request_success_shape() {
        let json = serde_json::to_value(RequestCodeResponse::sent("Code sent successfully")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "message": "Code sent successfully"})
        );
    }

    #[test]
    fn test_failure_kind_not_serialized() {
        let response = RequestCodeResponse::failed(FailureKind::StoreUnavailable);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("failure").is_none());
        assert_eq!(response.failure, Some(FailureKind::StoreUnavailable));
    }

    #[test]
    fn test_verify_success_shape() {
        let user = PublicIdentity {
            id: "abc".to_string(),
            email: "ana@example.com".to_string(),
            name: "ana".to_string(),
            role: Role::User,
        };
        let json = serde_json::to_value(VerifyCodeResponse::logged_in(user)).unwrap();
        assert_eq!(json["user"]["role"], "user");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_verify_failure_message() {
        let response = VerifyCodeResponse::failed(FailureKind::Expired);
        assert_eq!(response.error.as_deref(), Some("Invalid or expired code"));
    }
}
