//! Discovered workflow pattern.

use serde::{Deserialize, Serialize};

/// How a pattern was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSource {
    /// Proposed by the language-model capability.
    Model,
    /// Derived from the built-in keyword heuristic.
    Heuristic,
}

/// A reusable shape discovered for a goal, used to seed workflow generation.
///
/// Produced once per execution by the pattern agent and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    /// Discovery confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Ordered building-block type identifiers the pattern suggests.
    pub suggested_types: Vec<String>,
    pub source: PatternSource,
}

impl Pattern {
    pub fn new(name: impl Into<String>, confidence: f64, source: PatternSource) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
            suggested_types: Vec::new(),
            source,
        }
    }

    pub fn with_suggested_type(mut self, node_type: impl Into<String>) -> Self {
        self.suggested_types.push(node_type.into());
        self
    }

    pub fn with_suggested_types(mut self, types: impl IntoIterator<Item = String>) -> Self {
        self.suggested_types.extend(types);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let p = Pattern::new("trigger-action", 1.7, PatternSource::Model);
        assert_eq!(p.confidence, 1.0);

        let p = Pattern::new("trigger-action", -0.2, PatternSource::Heuristic);
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn test_suggested_types_preserve_order() {
        let p = Pattern::new("webhook-notify", 0.9, PatternSource::Heuristic)
            .with_suggested_type("core.webhook")
            .with_suggested_type("core.slack");
        assert_eq!(p.suggested_types, vec!["core.webhook", "core.slack"]);
    }
}
