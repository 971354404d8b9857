//! Shared memory service over the durable `MemoryStore` port.
//!
//! Passes context between pipeline stages and accumulates cross-run
//! statistics. TTL is honored lazily: expired entries read as absent even
//! when not physically purged.

use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;

use crate::domain::errors::DomainResult;
use crate::domain::models::MemoryEntry;
use crate::domain::ports::{MemoryStore, ScopeSummary};

pub struct SharedMemory {
    store: Arc<dyn MemoryStore>,
}

impl SharedMemory {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Write a value under `(scope, key)`, replacing any previous value
    /// (last-writer-wins).
    pub async fn set(
        &self,
        scope: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> DomainResult<()> {
        let mut entry = MemoryEntry::new(scope, key, value);
        if let Some(ttl) = ttl {
            entry = entry.with_ttl(ttl);
        }
        self.store.set(&entry).await
    }

    /// Read a value. Absent when never written or past its expiry.
    pub async fn get(&self, scope: &str, key: &str) -> DomainResult<Option<Value>> {
        Ok(self
            .store
            .get(scope, key)
            .await?
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value))
    }

    /// All live `(key, value)` pairs in a scope.
    pub async fn list(&self, scope: &str) -> DomainResult<Vec<(String, Value)>> {
        Ok(self
            .store
            .list(scope)
            .await?
            .into_iter()
            .filter(|entry| !entry.is_expired())
            .map(|entry| (entry.key, entry.value))
            .collect())
    }

    /// Add `by` to an integer counter, treating absent or non-integer
    /// values as zero. Returns the new value.
    pub async fn increment(&self, scope: &str, key: &str, by: i64) -> DomainResult<i64> {
        let current = self
            .get(scope, key)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let next = current + by;
        self.set(scope, key, Value::from(next), None).await?;
        Ok(next)
    }

    /// Entry counts per scope, for the status surface.
    pub async fn summary(&self) -> DomainResult<Vec<ScopeSummary>> {
        self.store.scopes().await
    }

    /// Physically delete expired entries. Maintenance only; correctness
    /// never depends on it.
    pub async fn purge_expired(&self) -> DomainResult<u64> {
        self.store.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::capabilities::mock::InMemoryMemoryStore;
    use serde_json::json;

    fn memory() -> SharedMemory {
        SharedMemory::new(Arc::new(InMemoryMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let memory = memory();
        memory
            .set("pattern_agent", "last_pattern", json!({"name": "webhook-to-slack"}), None)
            .await
            .unwrap();

        let value = memory.get("pattern_agent", "last_pattern").await.unwrap();
        assert_eq!(value.unwrap()["name"], "webhook-to-slack");
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let memory = memory();
        assert!(memory.get("scope", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let memory = memory();
        memory.set("s", "k", json!(1), None).await.unwrap();
        memory.set("s", "k", json!(2), None).await.unwrap();
        assert_eq!(memory.get("s", "k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_absent() {
        let memory = memory();
        memory
            .set("s", "k", json!("soon gone"), Some(Duration::milliseconds(10)))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(memory.get("s", "k").await.unwrap().is_none());

        // The row still exists physically until purged.
        assert_eq!(memory.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_expired() {
        let memory = memory();
        memory.set("s", "live", json!(1), None).await.unwrap();
        memory
            .set("s", "dead", json!(2), Some(Duration::milliseconds(-5)))
            .await
            .unwrap();

        let entries = memory.list("s").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "live");
    }

    #[tokio::test]
    async fn test_increment_counter() {
        let memory = memory();
        assert_eq!(memory.increment("learning", "total_runs", 1).await.unwrap(), 1);
        assert_eq!(memory.increment("learning", "total_runs", 1).await.unwrap(), 2);
        assert_eq!(
            memory.get("learning", "total_runs").await.unwrap(),
            Some(json!(2))
        );
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let memory = memory();
        memory.set("a", "k", json!(1), None).await.unwrap();
        memory.set("b", "k", json!(2), None).await.unwrap();

        assert_eq!(memory.get("a", "k").await.unwrap(), Some(json!(1)));
        assert_eq!(memory.get("b", "k").await.unwrap(), Some(json!(2)));
    }
}
