//! Knowledge-graph port - interface for the related-entity collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::GraphInsight;

/// A diff applied back to the knowledge graph after an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphUpdate {
    pub entity: String,
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Trait for knowledge-graph capability implementations.
///
/// Treated as a remote service; results may be cached by the collaborator
/// itself, never by the core.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Look up entities and relationships relevant to a query.
    async fn query(&self, text: &str) -> DomainResult<GraphInsight>;

    /// Apply an update diff.
    async fn apply_update(&self, update: GraphUpdate) -> DomainResult<()>;

    /// Invalidate the collaborator's cache.
    async fn invalidate_cache(&self) -> DomainResult<()>;
}
