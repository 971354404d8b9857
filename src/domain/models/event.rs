//! Pipeline event envelope and topic matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The fixed set of observable pipeline transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    PipelineStarted,
    PatternDiscovered,
    PatternGraphQueried,
    WorkflowGenerated,
    ValidationCompleted,
    ValidationFailed,
    PipelineCompleted,
    PipelineFailed,
}

impl EventTopic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PipelineStarted => "pipeline:started",
            Self::PatternDiscovered => "pattern:discovered",
            Self::PatternGraphQueried => "pattern:graph_queried",
            Self::WorkflowGenerated => "workflow:generated",
            Self::ValidationCompleted => "validation:completed",
            Self::ValidationFailed => "validation:failed",
            Self::PipelineCompleted => "pipeline:completed",
            Self::PipelineFailed => "pipeline:failed",
        }
    }

    /// Match against a subscription pattern: exact topic, `*`, or a
    /// wildcard prefix such as `pattern:*`.
    pub fn matches(self, pattern: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix(":*") {
            return self
                .as_str()
                .split(':')
                .next()
                .is_some_and(|topic_prefix| topic_prefix == prefix);
        }
        self.as_str() == pattern
    }

    /// Terminal topics end an execution's event stream.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::PipelineCompleted | Self::PipelineFailed)
    }
}

impl std::fmt::Display for EventTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One observable transition. Created by the orchestrator or agents,
/// delivered to subscribers, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub id: Uuid,
    /// Monotonic per-bus sequence number, assigned at publish time.
    pub sequence: u64,
    pub topic: EventTopic,
    pub payload: Value,
    /// Component that emitted the event (e.g. `orchestrator`).
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn new(topic: EventTopic, payload: Value, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            topic,
            payload,
            source: source.into(),
            timestamp: Utc::now(),
        }
    }
}
