//! Workflow draft domain model.
//!
//! A draft is the candidate workflow graph produced by the generation agent:
//! typed nodes plus directed connections, in the target platform's terms.
//! Drafts are immutable once produced; a failed validation yields a new
//! draft on retry, never a patched one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Canvas position of a node on the target platform's editor grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A single node in a workflow draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique name within the draft; connections reference this.
    pub name: String,
    /// Building-block type identifier (e.g. `core.webhook`).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node parameters in the platform's own shape.
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
    /// Declared credentials, keyed by credential kind (e.g. `slackApi`).
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    #[serde(default)]
    pub position: Position,
}

impl WorkflowNode {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            parameters: HashMap::new(),
            credentials: HashMap::new(),
            position: Position::default(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_credential(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.credentials.insert(kind.into(), name.into());
        self
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Position { x, y };
        self
    }
}

fn default_connection_kind() -> String {
    "main".to_string()
}

/// A directed connection between two named nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConnection {
    /// Source node name.
    pub from: String,
    /// Target node name.
    pub to: String,
    /// Connection kind on the target platform (`main` carries data flow).
    #[serde(default = "default_connection_kind")]
    pub kind: String,
    /// Output index on the source node.
    #[serde(default)]
    pub output_index: u32,
}

impl NodeConnection {
    pub fn main(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: default_connection_kind(),
            output_index: 0,
        }
    }
}

/// Candidate workflow graph. Never mutated after the generation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDraft {
    pub id: Uuid,
    pub name: String,
    pub nodes: Vec<WorkflowNode>,
    pub connections: Vec<NodeConnection>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_node(mut self, node: WorkflowNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_connection(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.connections.push(NodeConnection::main(from, to));
        self
    }

    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    /// All node type identifiers in draft order (duplicates preserved).
    pub fn node_types(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.node_type.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_builder() {
        let draft = WorkflowDraft::new("webhook-to-slack")
            .with_node(WorkflowNode::new("Webhook", "core.webhook").at(0, 0))
            .with_node(WorkflowNode::new("Slack", "core.slack").at(250, 0))
            .with_connection("Webhook", "Slack");

        assert_eq!(draft.nodes.len(), 2);
        assert_eq!(draft.connections.len(), 1);
        assert!(draft.has_node("Webhook"));
        assert!(!draft.has_node("Discord"));
        assert_eq!(draft.node_types(), vec!["core.webhook", "core.slack"]);
    }

    #[test]
    fn test_connection_defaults_to_main() {
        let conn = NodeConnection::main("A", "B");
        assert_eq!(conn.kind, "main");
        assert_eq!(conn.output_index, 0);
    }

    #[test]
    fn test_node_serialization_uses_type_key() {
        let node = WorkflowNode::new("Webhook", "core.webhook");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "core.webhook");
    }

    #[test]
    fn test_node_credentials() {
        let node = WorkflowNode::new("Slack", "core.slack").with_credential("slackApi", "default");
        assert_eq!(node.credentials.get("slackApi").map(String::as_str), Some("default"));
    }
}
