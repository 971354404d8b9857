//! Workflow generation agent.
//!
//! Produces a workflow draft from goal + pattern + optional graph
//! insight. Model-backed generation when available, with a deterministic
//! template fallback that chains the pattern's suggested types. Drafts
//! are immutable; a retry produces a new draft, never a patched one.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GraphInsight, Pattern, WorkflowDraft, WorkflowNode};
use crate::domain::ports::{GenerateOptions, LanguageModel, NodeCatalog};
use crate::services::agents::PipelineAgent;
use crate::services::shared_memory::SharedMemory;

const MEMORY_SCOPE: &str = "generation_agent";

/// Horizontal spacing between chained nodes on the canvas.
const NODE_SPACING_X: i32 = 250;

pub struct GenerationAgent {
    language_model: Option<Arc<dyn LanguageModel>>,
    catalog: Arc<dyn NodeCatalog>,
    memory: Arc<SharedMemory>,
}

impl GenerationAgent {
    pub fn new(
        language_model: Option<Arc<dyn LanguageModel>>,
        catalog: Arc<dyn NodeCatalog>,
        memory: Arc<SharedMemory>,
    ) -> Self {
        Self {
            language_model,
            catalog,
            memory,
        }
    }

    /// Generate a draft for the goal, seeded by the discovered pattern.
    pub async fn generate(
        &self,
        goal: &str,
        pattern: &Pattern,
        insight: Option<&GraphInsight>,
    ) -> DomainResult<WorkflowDraft> {
        let mut draft = None;
        if let Some(model) = &self.language_model {
            if model.is_available().await {
                match self
                    .generate_with_model(model.as_ref(), goal, pattern, insight)
                    .await
                {
                    Ok(generated) => draft = Some(generated),
                    Err(e) => {
                        tracing::debug!(error = %e, "model generation failed; using template");
                    }
                }
            }
        }
        let draft = match draft {
            Some(draft) => draft,
            None => self.template_draft(goal, pattern).await?,
        };

        tracing::info!(
            workflow = %draft.name,
            nodes = draft.nodes.len(),
            connections = draft.connections.len(),
            "workflow draft generated"
        );

        self.memory
            .set(
                MEMORY_SCOPE,
                "last_workflow",
                json!({
                    "id": draft.id,
                    "name": draft.name,
                    "nodes": draft.nodes.len(),
                }),
                Some(Duration::hours(1)),
            )
            .await?;

        Ok(draft)
    }

    async fn generate_with_model(
        &self,
        model: &dyn LanguageModel,
        goal: &str,
        pattern: &Pattern,
        insight: Option<&GraphInsight>,
    ) -> DomainResult<WorkflowDraft> {
        let context = insight
            .filter(|i| !i.is_empty())
            .map(|i| format!("\nRelated knowledge: {}", i.summary))
            .unwrap_or_default();

        let prompt = format!(
            "Build an automation workflow for this goal.\n\
             Goal: {goal}\n\
             Pattern: {} (suggested node types: {}){context}\n\n\
             Respond with JSON only:\n\
             {{\"name\": \"workflow-name\", \
             \"nodes\": [{{\"name\": \"...\", \"type\": \"core....\", \"parameters\": {{}}}}], \
             \"connections\": [{{\"from\": \"...\", \"to\": \"...\"}}]}}",
            pattern.name,
            pattern.suggested_types.join(", "),
        );

        let response = model.generate(&prompt, &GenerateOptions::default()).await?;
        let proposal = parse_draft_proposal(&response).ok_or_else(|| {
            DomainError::stage("generation", "model response did not contain a workflow draft")
        })?;

        if proposal.nodes.is_empty() {
            return Err(DomainError::stage(
                "generation",
                "model proposed a workflow without nodes",
            ));
        }

        let mut draft = WorkflowDraft::new(proposal.name);
        for (index, node) in proposal.nodes.into_iter().enumerate() {
            let workflow_node = WorkflowNode {
                name: node.name,
                node_type: node.node_type,
                parameters: node.parameters,
                credentials: Default::default(),
                position: crate::domain::models::Position {
                    x: index as i32 * NODE_SPACING_X,
                    y: 0,
                },
            };
            draft = draft.with_node(self.attach_credentials(workflow_node).await?);
        }
        for connection in proposal.connections {
            draft = draft.with_connection(connection.from, connection.to);
        }
        Ok(draft)
    }

    /// Deterministic fallback: chain the pattern's suggested types into a
    /// linear workflow, seeding parameters and credentials from catalog
    /// metadata.
    async fn template_draft(&self, goal: &str, pattern: &Pattern) -> DomainResult<WorkflowDraft> {
        if pattern.suggested_types.is_empty() {
            return Err(DomainError::stage(
                "generation",
                "pattern suggested no node types",
            ));
        }

        let mut draft = WorkflowDraft::new(slugify(goal));
        let mut used_names: HashSet<String> = HashSet::new();
        let mut previous: Option<String> = None;

        for (index, node_type) in pattern.suggested_types.iter().enumerate() {
            let metadata = self.catalog.describe(node_type).await?;

            let base_name = metadata
                .as_ref()
                .map(|m| m.display_name.clone())
                .unwrap_or_else(|| short_name(node_type));
            let name = unique_name(&base_name, &mut used_names);

            let mut node = WorkflowNode::new(&name, node_type).at(index as i32 * NODE_SPACING_X, 0);
            if let Some(metadata) = &metadata {
                for parameter in &metadata.required_parameters {
                    node = node.with_parameter(parameter, Value::String(String::new()));
                }
            }
            node = self.attach_credentials(node).await?;
            draft = draft.with_node(node);

            if let Some(previous) = previous {
                draft = draft.with_connection(previous, name.clone());
            }
            previous = Some(name);
        }

        Ok(draft)
    }

    /// Declare every credential the catalog marks required for the node's
    /// type, so drafts clear the credentials layer by construction.
    async fn attach_credentials(&self, mut node: WorkflowNode) -> DomainResult<WorkflowNode> {
        if let Some(metadata) = self.catalog.describe(&node.node_type).await? {
            for kind in metadata.required_credentials() {
                if !node.credentials.contains_key(kind) {
                    node = node.with_credential(kind, "default");
                }
            }
        }
        Ok(node)
    }
}

#[async_trait]
impl PipelineAgent for GenerationAgent {
    fn name(&self) -> &'static str {
        "generation_agent"
    }

    fn memory_scope(&self) -> &'static str {
        MEMORY_SCOPE
    }

    async fn is_ready(&self) -> bool {
        match &self.language_model {
            Some(model) => model.is_available().await,
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DraftProposal {
    name: String,
    nodes: Vec<NodeProposal>,
    #[serde(default)]
    connections: Vec<ConnectionProposal>,
}

#[derive(Debug, Deserialize)]
struct NodeProposal {
    name: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    parameters: std::collections::HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ConnectionProposal {
    from: String,
    to: String,
}

fn parse_draft_proposal(text: &str) -> Option<DraftProposal> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn short_name(node_type: &str) -> String {
    node_type
        .rsplit('.')
        .next()
        .unwrap_or(node_type)
        .to_string()
}

fn unique_name(base: &str, used: &mut HashSet<String>) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base} {suffix}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Kebab-case workflow name from the goal, bounded in length.
fn slugify(goal: &str) -> String {
    let mut slug = String::new();
    for c in goal.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    slug.chars().take(60).collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PatternSource;
    use crate::infrastructure::capabilities::catalog::StaticNodeCatalog;
    use crate::infrastructure::capabilities::mock::InMemoryMemoryStore;

    fn agent() -> GenerationAgent {
        GenerationAgent::new(
            None,
            Arc::new(StaticNodeCatalog::builtin()),
            Arc::new(SharedMemory::new(Arc::new(InMemoryMemoryStore::new()))),
        )
    }

    fn webhook_slack_pattern() -> Pattern {
        Pattern::new("webhook-to-slack", 0.8, PatternSource::Heuristic)
            .with_suggested_type("core.webhook")
            .with_suggested_type("core.slack")
    }

    #[tokio::test]
    async fn test_template_draft_chains_nodes() {
        let draft = agent()
            .generate(
                "send a Slack message when a webhook is received",
                &webhook_slack_pattern(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(draft.nodes.len(), 2);
        assert_eq!(draft.connections.len(), 1);
        assert_eq!(draft.nodes[0].node_type, "core.webhook");
        assert_eq!(draft.nodes[1].node_type, "core.slack");
        assert_eq!(draft.connections[0].from, draft.nodes[0].name);
        assert_eq!(draft.connections[0].to, draft.nodes[1].name);
    }

    #[tokio::test]
    async fn test_template_draft_declares_required_credentials() {
        let draft = agent()
            .generate("notify slack", &webhook_slack_pattern(), None)
            .await
            .unwrap();

        let slack = draft
            .nodes
            .iter()
            .find(|n| n.node_type == "core.slack")
            .unwrap();
        assert!(slack.credentials.contains_key("slackApi"));
    }

    #[tokio::test]
    async fn test_template_draft_positions_nodes() {
        let draft = agent()
            .generate("notify slack on webhook", &webhook_slack_pattern(), None)
            .await
            .unwrap();

        assert_eq!(draft.nodes[0].position.x, 0);
        assert_eq!(draft.nodes[1].position.x, NODE_SPACING_X);
    }

    #[tokio::test]
    async fn test_duplicate_types_get_unique_names() {
        let pattern = Pattern::new("double-http", 0.6, PatternSource::Heuristic)
            .with_suggested_type("core.httpRequest")
            .with_suggested_type("core.httpRequest");

        let draft = agent().generate("call two apis", &pattern, None).await.unwrap();

        assert_eq!(draft.nodes.len(), 2);
        assert_ne!(draft.nodes[0].name, draft.nodes[1].name);
    }

    #[tokio::test]
    async fn test_empty_pattern_is_a_stage_error() {
        let pattern = Pattern::new("empty", 0.1, PatternSource::Heuristic);
        let result = agent().generate("goal", &pattern, None).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Send a Slack message when a webhook is received!"),
            "send-a-slack-message-when-a-webhook-is-received"
        );
        assert_eq!(slugify("  API -> DB  "), "api-db");
    }
}
