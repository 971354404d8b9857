//! Local stand-ins used when no remote collaborator is configured.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{GraphInsight, WorkflowDraft};
use crate::domain::ports::{DryRunReport, DryRunner, GraphUpdate, KnowledgeGraph};

/// Knowledge graph that knows nothing. Queries return an empty insight;
/// updates are dropped.
pub struct NullKnowledgeGraph;

#[async_trait]
impl KnowledgeGraph for NullKnowledgeGraph {
    async fn query(&self, _text: &str) -> DomainResult<GraphInsight> {
        Ok(GraphInsight::default())
    }

    async fn apply_update(&self, _update: GraphUpdate) -> DomainResult<()> {
        Ok(())
    }

    async fn invalidate_cache(&self) -> DomainResult<()> {
        Ok(())
    }
}

/// Offline structural acceptance check standing in for the platform's
/// dry-run endpoint: a draft is accepted when it has nodes and every
/// connection references a node in the draft.
pub struct LocalDryRunner;

#[async_trait]
impl DryRunner for LocalDryRunner {
    async fn submit(&self, draft: &WorkflowDraft) -> DomainResult<DryRunReport> {
        let mut diagnostics = Vec::new();

        if draft.nodes.is_empty() {
            diagnostics.push("workflow has no nodes".to_string());
        }
        for connection in &draft.connections {
            for endpoint in [&connection.from, &connection.to] {
                if !draft.has_node(endpoint) {
                    diagnostics.push(format!("connection references unknown node {endpoint}"));
                }
            }
        }

        if diagnostics.is_empty() {
            Ok(DryRunReport::accepted())
        } else {
            Ok(DryRunReport::rejected(diagnostics))
        }
    }
}
