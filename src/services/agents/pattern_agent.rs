//! Pattern discovery agent.
//!
//! Discovers a reusable workflow shape for a goal. Uses the language
//! model when available, with a deterministic keyword heuristic as
//! fallback, and queries the knowledge-graph collaborator for related
//! entities.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GraphInsight, Pattern, PatternSource};
use crate::domain::ports::{GenerateOptions, KnowledgeGraph, LanguageModel};
use crate::services::agents::PipelineAgent;
use crate::services::shared_memory::SharedMemory;

const MEMORY_SCOPE: &str = "pattern_agent";

pub struct PatternAgent {
    language_model: Option<Arc<dyn LanguageModel>>,
    knowledge_graph: Arc<dyn KnowledgeGraph>,
    memory: Arc<SharedMemory>,
}

impl PatternAgent {
    pub fn new(
        language_model: Option<Arc<dyn LanguageModel>>,
        knowledge_graph: Arc<dyn KnowledgeGraph>,
        memory: Arc<SharedMemory>,
    ) -> Self {
        Self {
            language_model,
            knowledge_graph,
            memory,
        }
    }

    /// Discover a pattern for the goal. Produced once per execution and
    /// immutable thereafter.
    pub async fn discover(&self, goal: &str) -> DomainResult<Pattern> {
        let mut pattern = None;
        if let Some(model) = &self.language_model {
            if model.is_available().await {
                match self.discover_with_model(model.as_ref(), goal).await {
                    Ok(discovered) => pattern = Some(discovered),
                    Err(e) => {
                        tracing::debug!(error = %e, "model pattern discovery failed; using heuristic");
                    }
                }
            }
        }
        let pattern = pattern.unwrap_or_else(|| heuristic_pattern(goal));

        tracing::info!(
            pattern = %pattern.name,
            confidence = pattern.confidence,
            types = ?pattern.suggested_types,
            "pattern discovered"
        );

        self.memory
            .set(
                MEMORY_SCOPE,
                "last_pattern",
                serde_json::to_value(&pattern)?,
                Some(Duration::hours(1)),
            )
            .await?;

        Ok(pattern)
    }

    /// Query the knowledge graph for entities related to the goal.
    ///
    /// A collaborator error fails the graph stage; the orchestrator turns
    /// it into a structured pipeline failure.
    pub async fn query_graph(&self, goal: &str) -> DomainResult<GraphInsight> {
        let insight = self.knowledge_graph.query(goal).await?;
        self.memory
            .set(
                MEMORY_SCOPE,
                "last_insight",
                json!({
                    "related_entities": insight.related_entities.len(),
                    "summary": insight.summary,
                }),
                Some(Duration::hours(1)),
            )
            .await?;
        Ok(insight)
    }

    async fn discover_with_model(
        &self,
        model: &dyn LanguageModel,
        goal: &str,
    ) -> DomainResult<Pattern> {
        let prompt = format!(
            "Identify a reusable automation pattern for this goal.\n\
             Goal: {goal}\n\n\
             Known built-in node types: core.webhook, core.schedule, core.manualTrigger, \
             core.slack, core.emailSend, core.httpRequest, core.set, core.if, core.noOp.\n\n\
             Respond with JSON only:\n\
             {{\"name\": \"kebab-case-pattern-name\", \"confidence\": 0.0-1.0, \
             \"suggested_types\": [\"core....\"]}}"
        );

        let response = model.generate(&prompt, &GenerateOptions::default()).await?;
        let proposal = parse_pattern_proposal(&response).ok_or_else(|| {
            DomainError::stage("pattern", "model response did not contain a pattern proposal")
        })?;

        if proposal.suggested_types.is_empty() {
            return Err(DomainError::stage(
                "pattern",
                "model proposed a pattern without node types",
            ));
        }

        Ok(
            Pattern::new(proposal.name, proposal.confidence, PatternSource::Model)
                .with_suggested_types(proposal.suggested_types),
        )
    }
}

#[async_trait]
impl PipelineAgent for PatternAgent {
    fn name(&self) -> &'static str {
        "pattern_agent"
    }

    fn memory_scope(&self) -> &'static str {
        MEMORY_SCOPE
    }

    async fn is_ready(&self) -> bool {
        match &self.language_model {
            Some(model) => model.is_available().await,
            // The heuristic path needs nothing external.
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PatternProposal {
    name: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    suggested_types: Vec<String>,
}

fn parse_pattern_proposal(text: &str) -> Option<PatternProposal> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Deterministic keyword heuristic used when no model is available.
pub fn heuristic_pattern(goal: &str) -> Pattern {
    let lower = goal.to_lowercase();

    let trigger = if lower.contains("webhook") {
        "core.webhook"
    } else if ["schedule", "every ", "daily", "hourly", "cron"]
        .iter()
        .any(|k| lower.contains(k))
    {
        "core.schedule"
    } else {
        "core.manualTrigger"
    };

    const ACTION_KEYWORDS: &[(&[&str], &str)] = &[
        (&["slack"], "core.slack"),
        (&["email", "mail"], "core.emailSend"),
        (&["http", "api", "request", "fetch", "post to"], "core.httpRequest"),
        (&["transform", "format", "map "], "core.set"),
        (&["only if", "only when", "condition"], "core.if"),
    ];

    let mut actions: Vec<&str> = Vec::new();
    for (keywords, node_type) in ACTION_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            actions.push(node_type);
        }
    }

    let confidence = if actions.is_empty() { 0.4 } else { 0.75 };
    if actions.is_empty() {
        actions.push("core.noOp");
    }

    let short = |t: &str| t.rsplit('.').next().unwrap_or(t).to_lowercase();
    let name = format!("{}-to-{}", short(trigger), short(actions[0]));

    let mut types = vec![trigger.to_string()];
    types.extend(actions.iter().map(|t| (*t).to_string()));

    Pattern::new(name, confidence, PatternSource::Heuristic).with_suggested_types(types)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_webhook_slack() {
        let pattern = heuristic_pattern("send a Slack message when a webhook is received");
        assert_eq!(pattern.name, "webhook-to-slack");
        assert_eq!(pattern.source, PatternSource::Heuristic);
        assert_eq!(pattern.suggested_types, vec!["core.webhook", "core.slack"]);
        assert!(pattern.confidence > 0.5);
    }

    #[test]
    fn test_heuristic_schedule_email() {
        let pattern = heuristic_pattern("email me a report every morning");
        assert_eq!(pattern.suggested_types[0], "core.schedule");
        assert!(pattern
            .suggested_types
            .contains(&"core.emailSend".to_string()));
    }

    #[test]
    fn test_heuristic_unknown_goal_falls_back() {
        let pattern = heuristic_pattern("do something mysterious");
        assert_eq!(
            pattern.suggested_types,
            vec!["core.manualTrigger", "core.noOp"]
        );
        assert!(pattern.confidence < 0.5);
    }

    #[test]
    fn test_parse_proposal_from_noisy_response() {
        let proposal = parse_pattern_proposal(
            "Here you go:\n{\"name\": \"webhook-to-slack\", \"confidence\": 0.9, \
             \"suggested_types\": [\"core.webhook\", \"core.slack\"]}",
        )
        .unwrap();
        assert_eq!(proposal.name, "webhook-to-slack");
        assert_eq!(proposal.suggested_types.len(), 2);
    }
}
