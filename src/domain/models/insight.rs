//! Knowledge-graph lookup result.

use serde::{Deserialize, Serialize};

/// An entity the knowledge graph relates to the queried goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub name: String,
    pub entity_type: String,
    /// Relevance in `[0.0, 1.0]` as reported by the collaborator.
    pub relevance: f64,
}

/// A typed relationship between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub from: String,
    pub to: String,
    pub kind: String,
}

/// Result of an external knowledge-graph lookup.
///
/// Read-only to the core; any caching happens inside the collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInsight {
    #[serde(default)]
    pub related_entities: Vec<RelatedEntity>,
    #[serde(default)]
    pub relationships: Vec<EntityRelationship>,
    #[serde(default)]
    pub summary: String,
}

impl GraphInsight {
    pub fn is_empty(&self) -> bool {
        self.related_entities.is_empty() && self.relationships.is_empty() && self.summary.is_empty()
    }
}
