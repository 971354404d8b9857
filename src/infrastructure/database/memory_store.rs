//! SQLite implementation of the MemoryStore port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::MemoryEntry;
use crate::domain::ports::{MemoryStore, ScopeSummary};

#[derive(Clone)]
pub struct SqliteMemoryStore {
    pool: SqlitePool,
}

impl SqliteMemoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn set(&self, entry: &MemoryEntry) -> DomainResult<()> {
        let value_json = serde_json::to_string(&entry.value)?;

        sqlx::query(
            r#"INSERT INTO memory_entries (scope, key, value, created_at, updated_at, expires_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT (scope, key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at,
                   expires_at = excluded.expires_at"#,
        )
        .bind(&entry.scope)
        .bind(&entry.key)
        .bind(value_json)
        .bind(entry.created_at.to_rfc3339())
        .bind(entry.updated_at.to_rfc3339())
        .bind(entry.expires_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, scope: &str, key: &str) -> DomainResult<Option<MemoryEntry>> {
        let row: Option<MemoryEntryRow> = sqlx::query_as(
            "SELECT scope, key, value, created_at, updated_at, expires_at
             FROM memory_entries WHERE scope = ? AND key = ?",
        )
        .bind(scope)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MemoryEntryRow::try_into).transpose()
    }

    async fn list(&self, scope: &str) -> DomainResult<Vec<MemoryEntry>> {
        let rows: Vec<MemoryEntryRow> = sqlx::query_as(
            "SELECT scope, key, value, created_at, updated_at, expires_at
             FROM memory_entries WHERE scope = ? ORDER BY key",
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MemoryEntryRow::try_into).collect()
    }

    async fn scopes(&self) -> DomainResult<Vec<ScopeSummary>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT scope, COUNT(*) FROM memory_entries GROUP BY scope ORDER BY scope",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(scope, entries)| ScopeSummary {
                scope,
                entries: entries.max(0) as u64,
            })
            .collect())
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        let result = sqlx::query(
            "DELETE FROM memory_entries WHERE expires_at IS NOT NULL AND expires_at < ?",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct MemoryEntryRow {
    scope: String,
    key: String,
    value: String,
    created_at: String,
    updated_at: String,
    expires_at: Option<String>,
}

impl TryFrom<MemoryEntryRow> for MemoryEntry {
    type Error = DomainError;

    fn try_from(row: MemoryEntryRow) -> Result<Self, Self::Error> {
        Ok(MemoryEntry {
            scope: row.scope,
            key: row.key,
            value: serde_json::from_str(&row.value)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            expires_at: row.expires_at.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

fn parse_datetime(text: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::SerializationError(format!("invalid timestamp {text}: {e}")))
}
