//! Memory store port - durable backing for shared memory.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::MemoryEntry;

/// Per-scope entry count, used by the status surface.
#[derive(Debug, Clone)]
pub struct ScopeSummary {
    pub scope: String,
    pub entries: u64,
}

/// Trait for durable shared-memory storage.
///
/// Implementations must be safe for concurrent multi-execution access.
/// Writers to the same `(scope, key)` resolve last-writer-wins.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert or replace an entry (upsert on `(scope, key)`).
    async fn set(&self, entry: &MemoryEntry) -> DomainResult<()>;

    /// Fetch an entry. Implementations return the stored row even when
    /// expired; the service layer applies lazy expiry.
    async fn get(&self, scope: &str, key: &str) -> DomainResult<Option<MemoryEntry>>;

    /// All entries in a scope.
    async fn list(&self, scope: &str) -> DomainResult<Vec<MemoryEntry>>;

    /// Entry counts per scope.
    async fn scopes(&self) -> DomainResult<Vec<ScopeSummary>>;

    /// Physically delete expired entries. Optional maintenance; lazy
    /// expiry on read is the correctness mechanism.
    async fn purge_expired(&self) -> DomainResult<u64>;
}
