//! 集成测试：邮箱验证码登录
//!
//! 测试签发、验证、过期、覆盖、并发消费等完整流程。

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::GatedStore;
use login_code::audit::{EventType, InMemoryAuditLogger};
use login_code::clock::{Clock, ManualClock};
use login_code::delivery::MemoryOutbox;
use login_code::identity::PendingCode;
use login_code::passwordless::LoginCodeService;
use login_code::rbac::{Capability, Role};
use login_code::store::{IdentityStore, InMemoryIdentityStore, RoleChange};
use login_code::{FailureKind, LoginCodeConfig};

struct Harness {
    service: LoginCodeService,
    outbox: MemoryOutbox,
    clock: ManualClock,
    audit: InMemoryAuditLogger,
}

fn harness_with(config: LoginCodeConfig) -> Harness {
    let outbox = MemoryOutbox::new();
    let clock = ManualClock::starting_now();
    let audit = InMemoryAuditLogger::new();
    let service = LoginCodeService::new(
        Arc::new(InMemoryIdentityStore::new()),
        Arc::new(outbox.clone()),
    )
    .with_config(config)
    .with_clock(Arc::new(clock.clone()))
    .with_audit_logger(Arc::new(audit.clone()));

    Harness {
        service,
        outbox,
        clock,
        audit,
    }
}

fn harness() -> Harness {
    harness_with(LoginCodeConfig::default())
}

/// 测试基本登录流程以及验证码只能使用一次
#[tokio::test]
async fn test_round_trip_then_replay_fails() {
    let h = harness();

    let response = h.service.request_login_code("ana@example.com").await;
    assert!(response.success);
    assert_eq!(response.message.as_deref(), Some("Code sent successfully"));

    let code = h.outbox.last_code_for("ana@example.com").unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    // 第一次验证成功
    let response = h.service.verify_login_code("ana@example.com", &code).await;
    assert!(response.success);
    let user = response.user.unwrap();
    assert_eq!(user.email, "ana@example.com");

    // 第二次验证失败（已被消费）
    let response = h.service.verify_login_code("ana@example.com", &code).await;
    assert!(!response.success);
    assert_eq!(response.failure, Some(FailureKind::InvalidCode));
    assert_eq!(response.error.as_deref(), Some("Invalid or expired code"));
}

/// 测试过期边界：600000 毫秒时仍有效
#[tokio::test]
async fn test_code_valid_at_exact_ttl() {
    let h = harness();
    h.service.request_login_code("ana@example.com").await;
    let code = h.outbox.last_code_for("ana@example.com").unwrap();

    h.clock.advance(Duration::milliseconds(600_000));
    let response = h.service.verify_login_code("ana@example.com", &code).await;
    assert!(response.success);
}

/// 测试过期边界：600001 毫秒时失效
#[tokio::test]
async fn test_code_expired_one_ms_after_ttl() {
    let h = harness();
    h.service.request_login_code("ana@example.com").await;
    let code = h.outbox.last_code_for("ana@example.com").unwrap();

    h.clock.advance(Duration::milliseconds(600_001));
    let response = h.service.verify_login_code("ana@example.com", &code).await;
    assert!(!response.success);
    assert_eq!(response.failure, Some(FailureKind::Expired));
    assert_eq!(response.error.as_deref(), Some("Invalid or expired code"));
}

/// 测试新验证码覆盖旧验证码
#[tokio::test]
async fn test_new_code_supersedes_old() {
    let h = harness();

    h.service.request_login_code("ana@example.com").await;
    let first = h.outbox.last_code_for("ana@example.com").unwrap();

    let mut second = first.clone();
    while second == first {
        h.service.request_login_code("ana@example.com").await;
        second = h.outbox.last_code_for("ana@example.com").unwrap();
    }

    let response = h.service.verify_login_code("ana@example.com", &first).await;
    assert_eq!(response.failure, Some(FailureKind::InvalidCode));

    let response = h.service.verify_login_code("ana@example.com", &second).await;
    assert!(response.success);
}

/// 测试首次请求时创建身份
#[tokio::test]
async fn test_unknown_email_creates_identity() {
    let h = harness();
    assert!(h.service.store().is_empty().await);

    h.service.request_login_code("new@x.com").await;

    let record = h
        .service
        .store()
        .find_by_email("new@x.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.name, "new");
    assert_eq!(record.role, Role::User);
    assert!(record.has_pending_code());

    assert_eq!(
        h.audit.get_events_by_type(&EventType::IdentityCreated).len(),
        1
    );
}

/// 测试验证码是精确字符串比较
#[tokio::test]
async fn test_code_match_is_exact() {
    let h = harness();
    h.service.request_login_code("ana@example.com").await;

    let pending = PendingCode::new("004521", h.clock.now());
    h.service
        .store()
        .set_pending_code("ana@example.com", &pending)
        .await
        .unwrap();

    let response = h.service.verify_login_code("ana@example.com", "4521").await;
    assert_eq!(response.failure, Some(FailureKind::InvalidCode));

    let response = h.service.verify_login_code("ana@example.com", "004521").await;
    assert!(response.success);
}

const VERIFIERS: usize = 16;

/// 所有验证任务都读到待验证码后才开始清除，返回成功次数
async fn gated_verify_race(store: GatedStore<InMemoryIdentityStore>) -> usize {
    let outbox = MemoryOutbox::new();
    let service = Arc::new(LoginCodeService::new(
        Arc::new(store),
        Arc::new(outbox.clone()),
    ));

    // 签发不经过 find_by_email，不会碰到屏障
    assert!(service.request_login_code("ana@example.com").await.success);
    let code = outbox.last_code_for("ana@example.com").unwrap();

    let mut handles = Vec::new();
    for _ in 0..VERIFIERS {
        let service = service.clone();
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            service.verify_login_code("ana@example.com", &code).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().success {
            successes += 1;
        }
    }
    successes
}

/// 测试并发验证同一个验证码只有一个成功
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verify_single_success() {
    let store = GatedStore::new(Arc::new(InMemoryIdentityStore::new()), VERIFIERS);
    assert_eq!(gated_verify_race(store).await, 1);
}

/// 测试屏障确实让所有验证任务同时看到验证码：无条件清除会让每个任务都成功
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_gated_race_exposes_unconditional_clear() {
    let store = GatedStore::new(Arc::new(InMemoryIdentityStore::new()), VERIFIERS)
        .with_unconditional_clear();
    assert_eq!(gated_verify_race(store).await, VERIFIERS);
}

/// 测试未知邮箱验证
#[tokio::test]
async fn test_verify_unknown_email() {
    let h = harness();
    let response = h.service.verify_login_code("ghost@example.com", "123456").await;
    assert_eq!(response.failure, Some(FailureKind::NotFound));
    assert_eq!(response.error.as_deref(), Some("User not found"));
}

/// 测试必填字段
#[tokio::test]
async fn test_required_fields() {
    let h = harness();

    let response = h.service.request_login_code("").await;
    assert_eq!(response.error.as_deref(), Some("Email is required"));

    let response = h.service.verify_login_code("", "123456").await;
    assert_eq!(response.error.as_deref(), Some("Email and code are required"));

    let response = h.service.verify_login_code("ana@example.com", "").await;
    assert_eq!(response.failure, Some(FailureKind::InvalidInput));
}

/// 测试投递失败时验证码仍然保留
#[tokio::test]
async fn test_delivery_failure_keeps_code_verifiable() {
    let h = harness();
    h.outbox.set_failing(true);

    let response = h.service.request_login_code("ana@example.com").await;
    assert!(!response.success);
    assert_eq!(response.failure, Some(FailureKind::DeliveryFailed));
    assert_eq!(
        h.audit
            .get_events_by_type(&EventType::CodeDeliveryFailed)
            .len(),
        1
    );

    let record = h
        .service
        .store()
        .find_by_email("ana@example.com")
        .await
        .unwrap()
        .unwrap();
    let code = record.pending_code.unwrap().code;

    let response = h.service.verify_login_code("ana@example.com", &code).await;
    assert!(response.success);
}

/// 测试开发环境投递失败仍报告成功
#[tokio::test]
async fn test_lenient_delivery_reports_success() {
    let h = harness_with(LoginCodeConfig::development());
    h.outbox.set_failing(true);

    let response = h.service.request_login_code("ana@example.com").await;
    assert!(response.success);
    assert_eq!(
        response.message.as_deref(),
        Some("Code generated (development mode)")
    );
}

/// 测试存储不可用时不会报告为验证码错误
#[tokio::test]
async fn test_closed_store_is_store_unavailable() {
    let h = harness();
    h.service.request_login_code("ana@example.com").await;
    let code = h.outbox.last_code_for("ana@example.com").unwrap();

    h.service.store().close().await.unwrap();

    let response = h.service.verify_login_code("ana@example.com", &code).await;
    assert_eq!(response.failure, Some(FailureKind::StoreUnavailable));
    assert_ne!(response.error.as_deref(), Some("Invalid or expired code"));

    let response = h.service.request_login_code("bob@example.com").await;
    assert_eq!(response.failure, Some(FailureKind::StoreUnavailable));

    // 重新打开后验证码仍可用
    h.service.store().open().await.unwrap();
    let response = h.service.verify_login_code("ana@example.com", &code).await;
    assert!(response.success);
}

/// 测试提升管理员的三种结果
#[tokio::test]
async fn test_promote_to_admin() {
    let h = harness();

    assert_eq!(
        h.service.promote_to_admin("ghost@example.com").await.unwrap(),
        RoleChange::NotFound
    );

    h.service.request_login_code("ana@example.com").await;
    assert_eq!(
        h.service.promote_to_admin("ana@example.com").await.unwrap(),
        RoleChange::Changed
    );
    assert_eq!(
        h.service.promote_to_admin("ana@example.com").await.unwrap(),
        RoleChange::Unchanged
    );
    assert_eq!(h.audit.get_events_by_type(&EventType::RoleChanged).len(), 1);
}

/// 测试会话恢复和权限检查
#[tokio::test]
async fn test_restore_identity_and_authorize() {
    let h = harness();
    h.service.request_login_code("ana@example.com").await;
    let code = h.outbox.last_code_for("ana@example.com").unwrap();
    let user = h
        .service
        .verify_login_code("ana@example.com", &code)
        .await
        .user
        .unwrap();

    let restored = h.service.restore_identity(&user.id).await.unwrap().unwrap();
    assert_eq!(restored, user);
    assert!(h.service.restore_identity("missing").await.unwrap().is_none());

    assert!(!h.service.is_admin(&user.id).await);
    assert!(!h.service.authorize(&user.id, Capability::ManageUsers).await);

    h.service.promote_to_admin("ana@example.com").await.unwrap();
    assert!(h.service.is_admin(&user.id).await);
    assert!(h.service.authorize(&user.id, Capability::ManageUsers).await);
}

/// 测试存储故障时 is_admin 返回 false
#[tokio::test]
async fn test_is_admin_false_when_store_closed() {
    let h = harness();
    h.service.request_login_code("ana@example.com").await;
    h.service.promote_to_admin("ana@example.com").await.unwrap();
    let record = h
        .service
        .store()
        .find_by_email("ana@example.com")
        .await
        .unwrap()
        .unwrap();

    h.service.store().close().await.unwrap();
    assert!(!h.service.is_admin(&record.id).await);
    assert!(h.service.restore_identity(&record.id).await.is_err());
}
