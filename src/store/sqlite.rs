//! SQLite 存储实现
//!
//! 时间以 Unix 毫秒整数保存；条件清除是一条带完整 `WHERE` 的 `UPDATE`。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info};

use crate::error::{Error, Result, StorageError};
use crate::identity::{IdentityRecord, PendingCode};
use crate::rbac::Role;

use super::{IdentityStore, RoleChange};

const SELECT_COLUMNS: &str = "id, email, name, role, verification_code, \
     verification_code_issued_at, created_at";

/// SQLite 身份存储
#[derive(Debug, Clone)]
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    /// 连接数据库
    ///
    /// `sqlite::memory:` 需要单连接，否则每个连接各自是一个空库。
    pub async fn connect(url: &str) -> Result<Self> {
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        Self::connect_with(url, max_connections).await
    }

    /// 指定连接数连接数据库
    pub async fn connect_with(url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// 使用已有连接池
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn open(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(Error::store_unavailable("sqlite pool has been closed"));
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                verification_code TEXT,
                verification_code_issued_at INTEGER,
                created_at INTEGER NOT NULL,
                CHECK ((verification_code IS NULL) = (verification_code_issued_at IS NULL))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("identity schema ready");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        debug!("identity store closed");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM identities WHERE email = ?",
            SELECT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM identities WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn insert_if_absent(&self, record: &IdentityRecord) -> Result<bool> {
        let (code, issued_at) = match &record.pending_code {
            Some(pending) => (
                Some(pending.code.as_str()),
                Some(pending.issued_at.timestamp_millis()),
            ),
            None => (None, None),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO identities
                (id, email, name, role, verification_code, verification_code_issued_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(&record.id)
        .bind(&record.email)
        .bind(&record.name)
        .bind(record.role.as_str())
        .bind(code)
        .bind(issued_at)
        .bind(record.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_pending_code(&self, email: &str, pending: &PendingCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE identities
            SET verification_code = ?, verification_code_issued_at = ?
            WHERE email = ?
            "#,
        )
        .bind(&pending.code)
        .bind(pending.issued_at.timestamp_millis())
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear_pending_code_if(&self, email: &str, expected: &PendingCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE identities
            SET verification_code = NULL, verification_code_issued_at = NULL
            WHERE email = ?
              AND verification_code = ?
              AND verification_code_issued_at = ?
            "#,
        )
        .bind(email)
        .bind(&expected.code)
        .bind(expected.issued_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<RoleChange> {
        let current: Option<String> = sqlx::query("SELECT role FROM identities WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.try_get("role"))
            .transpose()?;

        match current {
            None => Ok(RoleChange::NotFound),
            Some(current) if current == role.as_str() => Ok(RoleChange::Unchanged),
            Some(_) => {
                let result = sqlx::query("UPDATE identities SET role = ? WHERE email = ? AND role <> ?")
                    .bind(role.as_str())
                    .bind(email)
                    .bind(role.as_str())
                    .execute(&self.pool)
                    .await?;
                if result.rows_affected() == 1 {
                    Ok(RoleChange::Changed)
                } else {
                    Ok(RoleChange::Unchanged)
                }
            }
        }
    }
}

// ============================================================================
// 行映射
// ============================================================================

fn record_from_row(row: &SqliteRow) -> Result<IdentityRecord> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| StorageError::OperationFailed(e.to_string()))?;

    let code: Option<String> = row.try_get("verification_code")?;
    let issued_at: Option<i64> = row.try_get("verification_code_issued_at")?;
    let pending_code = match (code, issued_at) {
        (Some(code), Some(ms)) => Some(PendingCode::new(code, millis_to_datetime(ms)?)),
        _ => None,
    };

    Ok(IdentityRecord {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        role,
        pending_code,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
    })
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        Error::Storage(StorageError::OperationFailed(format!(
            "timestamp out of range: {}",
            ms
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::truncate_to_millis;

    async fn store() -> SqliteIdentityStore {
        let store = SqliteIdentityStore::connect("sqlite::memory:").await.unwrap();
        store.open().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_record_round_trip() {
        let store = store().await;
        let mut record =
            IdentityRecord::new_for_email("ana@example.com", truncate_to_millis(Utc::now()))
                .unwrap();
        record.pending_code = Some(PendingCode::new("004521", truncate_to_millis(Utc::now())));

        assert!(store.insert_if_absent(&record).await.unwrap());
        let found = store.find_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let store = store().await;
        store.open().await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let store = store().await;
        store.close().await.unwrap();

        let err = store.find_by_email("ana@example.com").await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Unavailable(_))));
        assert!(store.open().await.is_err());
    }
}
