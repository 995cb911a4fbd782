//! 登录服务
//!
//! 组合签发器、验证器、存储和审计日志，对外只返回响应结构，
//! 所有错误在这里被记录并转换为简短的用户提示。

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::audit::{AuditLogger, SecurityEvent, TracingAuditLogger};
use crate::clock::Clock;
use crate::config::LoginCodeConfig;
use crate::delivery::DeliveryChannel;
use crate::error::{Error, FailureKind, Result};
use crate::identity::PublicIdentity;
use crate::rbac::{self, Capability, Role};
use crate::store::{IdentityStore, InMemoryIdentityStore, RoleChange};

use super::issuer::CodeIssuer;
use super::response::{RequestCodeResponse, VerifyCodeResponse};
use super::store_call;
use super::verifier::CodeVerifier;

/// 请求验证码时邮箱为空的提示
pub const EMAIL_REQUIRED: &str = "Email is required";

/// 验证时邮箱或验证码为空的提示
pub const EMAIL_AND_CODE_REQUIRED: &str = "Email and code are required";

/// 登录验证码服务
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use login_code::delivery::LogDelivery;
/// use login_code::passwordless::LoginCodeService;
/// use login_code::store::InMemoryIdentityStore;
///
/// # async fn example() {
/// let service = LoginCodeService::new(
///     Arc::new(InMemoryIdentityStore::new()),
///     Arc::new(LogDelivery::new()),
/// );
///
/// let response = service.request_login_code("ana@example.com").await;
/// assert!(response.success);
/// # }
/// ```
pub struct LoginCodeService<S: IdentityStore = InMemoryIdentityStore> {
    store: Arc<S>,
    issuer: CodeIssuer<S>,
    verifier: CodeVerifier<S>,
    config: LoginCodeConfig,
    audit: Arc<dyn AuditLogger>,
}

impl<S: IdentityStore> LoginCodeService<S> {
    /// 创建服务
    pub fn new(store: Arc<S>, channel: Arc<dyn DeliveryChannel>) -> Self {
        Self {
            issuer: CodeIssuer::new(store.clone(), channel),
            verifier: CodeVerifier::new(store.clone()),
            store,
            config: LoginCodeConfig::default(),
            audit: Arc::new(TracingAuditLogger::new()),
        }
    }

    /// 设置配置
    pub fn with_config(mut self, config: LoginCodeConfig) -> Self {
        self.issuer = self.issuer.with_config(config.clone());
        self.verifier = self.verifier.with_config(config.clone());
        self.config = config;
        self
    }

    /// 设置时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.issuer = self.issuer.with_clock(clock.clone());
        self.verifier = self.verifier.with_clock(clock);
        self
    }

    /// 设置审计日志记录器
    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// 底层存储
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// 当前配置
    pub fn config(&self) -> &LoginCodeConfig {
        &self.config
    }

    // ========================================================================
    // 登录流程
    // ========================================================================

    /// 请求登录验证码
    pub async fn request_login_code(&self, email: &str) -> RequestCodeResponse {
        if email.trim().is_empty() {
            return RequestCodeResponse::failed_with(FailureKind::InvalidInput, EMAIL_REQUIRED);
        }

        match self.issuer.issue(email).await {
            Ok(issued) => {
                if let Some(id) = &issued.created_identity {
                    info!(email = %email, id = %id, "new identity registered on first code request");
                    self.audit.log(SecurityEvent::identity_created(email, id.clone()));
                }
                if issued.delivered {
                    info!(email = %email, expires_at = %issued.expires_at, "login code sent");
                    self.audit.log(SecurityEvent::code_issued(email));
                    RequestCodeResponse::sent("Code sent successfully")
                } else {
                    self.audit.log(SecurityEvent::code_delivery_failed(
                        email,
                        "lenient delivery, code kept",
                    ));
                    RequestCodeResponse::sent("Code generated (development mode)")
                }
            }
            Err(err) => {
                let kind = err.failure_kind();
                self.report("request_login_code", email, &err);
                if kind == FailureKind::DeliveryFailed {
                    self.audit
                        .log(SecurityEvent::code_delivery_failed(email, err.to_string()));
                }
                RequestCodeResponse::failed(kind)
            }
        }
    }

    /// 验证登录验证码
    pub async fn verify_login_code(&self, email: &str, code: &str) -> VerifyCodeResponse {
        if email.trim().is_empty() || code.trim().is_empty() {
            return VerifyCodeResponse::failed_with(
                FailureKind::InvalidInput,
                EMAIL_AND_CODE_REQUIRED,
            );
        }

        match self.verifier.verify(email, code).await {
            Ok(user) => {
                info!(email = %email, id = %user.id, "login code verified");
                self.audit.log(SecurityEvent::code_verified(email, user.id.clone()));
                VerifyCodeResponse::logged_in(user)
            }
            Err(err) => {
                let kind = err.failure_kind();
                self.report("verify_login_code", email, &err);
                if !err.is_infrastructure() {
                    self.audit
                        .log(SecurityEvent::code_rejected(email, kind.to_string()));
                }
                VerifyCodeResponse::failed(kind)
            }
        }
    }

    // ========================================================================
    // 会话与权限
    // ========================================================================

    /// 按身份 ID 恢复身份（会话恢复）
    pub async fn restore_identity(&self, id: &str) -> Result<Option<PublicIdentity>> {
        let record =
            store_call(self.config.io_timeout, "find_by_id", self.store.find_by_id(id)).await?;
        Ok(record.map(|r| r.public()))
    }

    /// 身份是否为管理员
    ///
    /// 身份不存在或存储故障时返回 `false`。
    pub async fn is_admin(&self, id: &str) -> bool {
        self.role_of(id).await.is_some_and(|role| role.is_admin())
    }

    /// 身份是否拥有某项能力
    pub async fn authorize(&self, id: &str, capability: Capability) -> bool {
        match self.role_of(id).await {
            Some(role) => rbac::authorize(role, capability),
            None => false,
        }
    }

    /// 将邮箱对应的身份提升为管理员
    pub async fn promote_to_admin(&self, email: &str) -> Result<RoleChange> {
        let change = store_call(
            self.config.io_timeout,
            "set_role",
            self.store.set_role(email, Role::Admin),
        )
        .await?;

        match change {
            RoleChange::Changed => {
                info!(email = %email, "identity promoted to admin");
                self.audit.log(SecurityEvent::role_changed(email, Role::Admin.as_str()));
            }
            RoleChange::Unchanged => info!(email = %email, "identity is already admin"),
            RoleChange::NotFound => warn!(email = %email, "no identity to promote"),
        }
        Ok(change)
    }

    async fn role_of(&self, id: &str) -> Option<Role> {
        match self.restore_identity(id).await {
            Ok(identity) => identity.map(|i| i.role),
            Err(err) => {
                error!(id = %id, error = %err, "role lookup failed");
                None
            }
        }
    }

    fn report(&self, operation: &str, email: &str, err: &Error) {
        let kind = err.failure_kind();
        if err.is_infrastructure() {
            error!(operation, email = %email, failure = %kind, error = %err, "login code operation failed");
        } else if kind == FailureKind::NotFound {
            info!(operation, email = %email, failure = %kind, "login code operation rejected");
        } else {
            warn!(operation, email = %email, failure = %kind, "login code operation rejected");
        }
    }
}
