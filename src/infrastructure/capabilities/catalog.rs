//! Built-in static node catalog.
//!
//! The default catalog when no remote endpoint is configured. Covers the
//! built-in `core.*` node types with their required parameters and
//! credential requirements.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{NodeCatalog, NodeMetadata};

pub struct StaticNodeCatalog {
    nodes: HashMap<String, NodeMetadata>,
}

impl StaticNodeCatalog {
    /// The built-in `core.*` catalog.
    pub fn builtin() -> Self {
        let entries = vec![
            NodeMetadata::new("core.webhook", "Webhook").with_required_parameter("path"),
            NodeMetadata::new("core.schedule", "Schedule").with_required_parameter("cron"),
            NodeMetadata::new("core.manualTrigger", "Manual Trigger"),
            NodeMetadata::new("core.slack", "Slack")
                .with_required_parameter("channel")
                .with_credential("slackApi", true),
            NodeMetadata::new("core.emailSend", "Send Email")
                .with_required_parameter("to")
                .with_required_parameter("subject")
                .with_credential("smtp", true),
            NodeMetadata::new("core.httpRequest", "HTTP Request")
                .with_required_parameter("url"),
            NodeMetadata::new("core.set", "Set"),
            NodeMetadata::new("core.if", "If").with_required_parameter("condition"),
            NodeMetadata::new("core.noOp", "No Operation"),
        ];

        Self {
            nodes: entries
                .into_iter()
                .map(|m| (m.type_identifier.clone(), m))
                .collect(),
        }
    }

    /// An empty catalog (every lookup misses). Useful in tests.
    pub fn empty() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Extend the catalog with an extra entry.
    pub fn with_node(mut self, metadata: NodeMetadata) -> Self {
        self.nodes.insert(metadata.type_identifier.clone(), metadata);
        self
    }

    pub fn type_identifiers(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }
}

#[async_trait]
impl NodeCatalog for StaticNodeCatalog {
    async fn exists(&self, type_identifier: &str) -> DomainResult<bool> {
        Ok(self.nodes.contains_key(type_identifier))
    }

    async fn describe(&self, type_identifier: &str) -> DomainResult<Option<NodeMetadata>> {
        Ok(self.nodes.get(type_identifier).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_catalog_contents() {
        let catalog = StaticNodeCatalog::builtin();
        assert!(catalog.exists("core.webhook").await.unwrap());
        assert!(catalog.exists("core.slack").await.unwrap());
        assert!(!catalog.exists("community.customNode").await.unwrap());
    }

    #[tokio::test]
    async fn test_slack_requires_credential() {
        let catalog = StaticNodeCatalog::builtin();
        let slack = catalog.describe("core.slack").await.unwrap().unwrap();
        assert_eq!(slack.required_credentials(), vec!["slackApi"]);
        assert!(slack.required_parameters.contains(&"channel".to_string()));
    }

    #[tokio::test]
    async fn test_with_node_extends_catalog() {
        let catalog = StaticNodeCatalog::empty()
            .with_node(NodeMetadata::new("community.trustedNode", "Trusted"));
        assert!(catalog.exists("community.trustedNode").await.unwrap());
        assert!(!catalog.exists("core.webhook").await.unwrap());
    }
}
