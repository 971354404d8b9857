//! Shared-memory entry model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A durable key/value entry scoped to one agent.
///
/// Last-writer-wins per `(scope, key)`. Expiry is honored lazily: an entry
/// past `expires_at` reads as absent even if not physically purged yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Agent scope (e.g. `pattern_agent`, `learning`).
    pub scope: String,
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` means the entry never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl MemoryEntry {
    pub fn new(scope: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        let now = Utc::now();
        Self {
            scope: scope.into(),
            key: key.into(),
            value,
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(Utc::now() + ttl);
        self
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => Utc::now() > exp,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = MemoryEntry::new("learning", "total_runs", json!(3));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expired_entry_reads_expired() {
        let entry = MemoryEntry::new("pattern_agent", "last_pattern", json!("x"))
            .with_ttl(Duration::milliseconds(-10));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_future_ttl_not_expired() {
        let entry =
            MemoryEntry::new("scope", "key", json!(null)).with_ttl(Duration::seconds(3600));
        assert!(!entry.is_expired());
    }
}
