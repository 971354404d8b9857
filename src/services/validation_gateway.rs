//! Seven-layer validation gateway for workflow drafts.
//!
//! Layers run strictly in order with fail-fast semantics: a failing layer
//! records its errors and stops the run; no later layer executes. Layers
//! 0-4 are cheap structural checks, 5-6 call external collaborators and
//! only run when every structural layer passed. The semantic layer (5) is
//! best-effort: an absent or unreachable language model skips it without
//! failing the draft. The dry-run layer (6) is the platform's own
//! authority and its rejection is always fatal.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::domain::models::{
    PipelineConfig, SemanticConfig, ValidationError, ValidationLayer, ValidationResult,
    ValidationWarning, WorkflowDraft,
};
use crate::domain::ports::{DryRunner, GenerateOptions, LanguageModel, NodeCatalog};
use crate::services::policy::PolicyEngine;

/// Outcome of one layer run.
enum LayerOutcome {
    Passed,
    PassedWithWarnings(Vec<ValidationWarning>),
    Skipped(String),
    Failed(Vec<ValidationError>),
}

/// The gateway. Holds the policy engine plus the external collaborators
/// that back layers 2-6.
pub struct ValidationGateway {
    policy: Arc<PolicyEngine>,
    catalog: Arc<dyn NodeCatalog>,
    dry_runner: Arc<dyn DryRunner>,
    language_model: Option<Arc<dyn LanguageModel>>,
    semantic: SemanticConfig,
    forbid_cycles: bool,
    layer_timeout: Duration,
}

impl ValidationGateway {
    pub fn new(
        policy: Arc<PolicyEngine>,
        catalog: Arc<dyn NodeCatalog>,
        dry_runner: Arc<dyn DryRunner>,
        semantic: SemanticConfig,
        pipeline: &PipelineConfig,
    ) -> Self {
        Self {
            policy,
            catalog,
            dry_runner,
            language_model: None,
            semantic,
            forbid_cycles: pipeline.forbid_cycles,
            layer_timeout: Duration::from_secs(pipeline.stage_timeout_secs),
        }
    }

    /// Attach the optional language model backing the semantic layer.
    pub fn with_language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Run all seven layers against a draft.
    ///
    /// `goal` is the original natural-language goal, used by the semantic
    /// layer to judge draft/goal consistency.
    pub async fn validate(&self, draft: &WorkflowDraft, goal: &str) -> ValidationResult {
        let started = Instant::now();
        let mut passed_layers = Vec::new();
        let mut skipped_layers = Vec::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut failed_layer = None;

        for layer in ValidationLayer::ORDERED {
            let outcome = match layer {
                ValidationLayer::Policy => self.check_policy(draft),
                ValidationLayer::Schema => self.check_schema(draft),
                ValidationLayer::Existence => self.check_existence(draft).await,
                ValidationLayer::Connections => self.check_connections(draft),
                ValidationLayer::Credentials => self.check_credentials(draft).await,
                ValidationLayer::Semantic => self.check_semantic(draft, goal).await,
                ValidationLayer::DryRun => self.check_dry_run(draft).await,
            };

            match outcome {
                LayerOutcome::Passed => passed_layers.push(layer),
                LayerOutcome::PassedWithWarnings(mut layer_warnings) => {
                    warnings.append(&mut layer_warnings);
                    passed_layers.push(layer);
                }
                LayerOutcome::Skipped(reason) => {
                    tracing::debug!(layer = %layer, reason = %reason, "validation layer skipped");
                    skipped_layers.push(layer);
                }
                LayerOutcome::Failed(mut layer_errors) => {
                    tracing::info!(
                        layer = %layer,
                        workflow = %draft.name,
                        error_count = layer_errors.len(),
                        "validation failed"
                    );
                    errors.append(&mut layer_errors);
                    failed_layer = Some(layer);
                    break;
                }
            }
        }

        ValidationResult {
            valid: failed_layer.is_none(),
            passed_layers,
            failed_layer,
            skipped_layers,
            errors,
            warnings,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    // Layer 0: every node type must be allowed by the policy engine.
    fn check_policy(&self, draft: &WorkflowDraft) -> LayerOutcome {
        let decision = self.policy.evaluate(draft.node_types());
        if decision.is_allowed() {
            return LayerOutcome::Passed;
        }

        let blocked_names: Vec<&str> = decision
            .blocked
            .iter()
            .map(|b| b.type_identifier.as_str())
            .collect();
        let mut error = ValidationError::new(
            ValidationLayer::Policy,
            "blocked_node_type",
            format!(
                "workflow uses blocked node type(s): {}",
                blocked_names.join(", ")
            ),
        );
        for blocked in decision.blocked {
            error = error.with_blocked_type(blocked.type_identifier, blocked.alternatives);
        }
        LayerOutcome::Failed(vec![error])
    }

    // Layer 1: structural schema of the draft.
    fn check_schema(&self, draft: &WorkflowDraft) -> LayerOutcome {
        let mut errors = Vec::new();

        if draft.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationLayer::Schema,
                "missing_field",
                "workflow name must not be empty",
            ));
        }
        if draft.nodes.is_empty() {
            errors.push(ValidationError::new(
                ValidationLayer::Schema,
                "missing_field",
                "workflow must contain at least one node",
            ));
        }

        let mut seen = HashSet::new();
        for node in &draft.nodes {
            if node.name.trim().is_empty() {
                errors.push(ValidationError::new(
                    ValidationLayer::Schema,
                    "missing_field",
                    "node name must not be empty",
                ));
            } else if !seen.insert(node.name.as_str()) {
                errors.push(ValidationError::new(
                    ValidationLayer::Schema,
                    "duplicate_node_name",
                    format!("duplicate node name: {}", node.name),
                ));
            }
            if node.node_type.trim().is_empty() {
                errors.push(ValidationError::new(
                    ValidationLayer::Schema,
                    "missing_field",
                    format!("node {} has an empty type", node.name),
                ));
            }
        }

        if errors.is_empty() {
            LayerOutcome::Passed
        } else {
            LayerOutcome::Failed(errors)
        }
    }

    // Layer 2: every node type must be known to the catalog.
    async fn check_existence(&self, draft: &WorkflowDraft) -> LayerOutcome {
        let mut errors = Vec::new();
        let mut checked = HashSet::new();

        for node in &draft.nodes {
            if !checked.insert(node.node_type.as_str()) {
                continue;
            }
            let exists = tokio::time::timeout(
                self.layer_timeout,
                self.catalog.exists(&node.node_type),
            )
            .await;
            match exists {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    errors.push(ValidationError::new(
                        ValidationLayer::Existence,
                        "unknown_node_type",
                        format!("node type not found in catalog: {}", node.node_type),
                    ));
                }
                Ok(Err(e)) => {
                    return LayerOutcome::Failed(vec![ValidationError::new(
                        ValidationLayer::Existence,
                        "catalog_unavailable",
                        format!("catalog lookup failed: {e}"),
                    )]);
                }
                Err(_) => {
                    return LayerOutcome::Failed(vec![ValidationError::new(
                        ValidationLayer::Existence,
                        "catalog_unavailable",
                        "catalog lookup timed out",
                    )]);
                }
            }
        }

        if errors.is_empty() {
            LayerOutcome::Passed
        } else {
            LayerOutcome::Failed(errors)
        }
    }

    // Layer 3: connection integrity.
    fn check_connections(&self, draft: &WorkflowDraft) -> LayerOutcome {
        let mut errors = Vec::new();
        let node_names: HashSet<&str> = draft.nodes.iter().map(|n| n.name.as_str()).collect();

        for connection in &draft.connections {
            for endpoint in [&connection.from, &connection.to] {
                if !node_names.contains(endpoint.as_str()) {
                    errors.push(ValidationError::new(
                        ValidationLayer::Connections,
                        "dangling_connection",
                        format!(
                            "connection {} -> {} references unknown node {}",
                            connection.from, connection.to, endpoint
                        ),
                    ));
                }
            }
        }

        if errors.is_empty() && self.forbid_cycles {
            if let Some(cycle) = find_cycle(draft) {
                errors.push(ValidationError::new(
                    ValidationLayer::Connections,
                    "connection_cycle",
                    format!("workflow contains a cycle: {}", cycle.join(" -> ")),
                ));
            }
        }

        if errors.is_empty() {
            LayerOutcome::Passed
        } else {
            LayerOutcome::Failed(errors)
        }
    }

    // Layer 4: required credentials must be declared.
    async fn check_credentials(&self, draft: &WorkflowDraft) -> LayerOutcome {
        let mut errors = Vec::new();
        let mut metadata_cache: HashMap<&str, Vec<String>> = HashMap::new();

        for node in &draft.nodes {
            let required = match metadata_cache.get(node.node_type.as_str()) {
                Some(required) => required.clone(),
                None => {
                    let described = tokio::time::timeout(
                        self.layer_timeout,
                        self.catalog.describe(&node.node_type),
                    )
                    .await;
                    let required: Vec<String> = match described {
                        Ok(Ok(Some(metadata))) => metadata
                            .required_credentials()
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                        // Existence already passed; a vanished type is a
                        // catalog inconsistency, not a credential error.
                        Ok(Ok(None)) => Vec::new(),
                        Ok(Err(e)) => {
                            return LayerOutcome::Failed(vec![ValidationError::new(
                                ValidationLayer::Credentials,
                                "catalog_unavailable",
                                format!("catalog describe failed: {e}"),
                            )]);
                        }
                        Err(_) => {
                            return LayerOutcome::Failed(vec![ValidationError::new(
                                ValidationLayer::Credentials,
                                "catalog_unavailable",
                                "catalog describe timed out",
                            )]);
                        }
                    };
                    metadata_cache.insert(node.node_type.as_str(), required.clone());
                    required
                }
            };

            for kind in required {
                if !node.credentials.contains_key(&kind) {
                    errors.push(ValidationError::new(
                        ValidationLayer::Credentials,
                        "missing_credential",
                        format!("node {} requires credential {kind}", node.name),
                    ));
                }
            }
        }

        if errors.is_empty() {
            LayerOutcome::Passed
        } else {
            LayerOutcome::Failed(errors)
        }
    }

    // Layer 5: optional model-backed goal consistency check.
    async fn check_semantic(&self, draft: &WorkflowDraft, goal: &str) -> LayerOutcome {
        let Some(model) = &self.language_model else {
            return LayerOutcome::Skipped("language model not configured".to_string());
        };
        if !model.is_available().await {
            return LayerOutcome::Skipped("language model unavailable".to_string());
        }

        let prompt = semantic_prompt(draft, goal);
        let response = tokio::time::timeout(
            self.layer_timeout,
            model.generate(&prompt, &GenerateOptions::default()),
        )
        .await;
        let text = match response {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                // Best-effort layer: a model error degrades to skipped.
                return LayerOutcome::Skipped(format!("language model error: {e}"));
            }
            Err(_) => {
                return LayerOutcome::Skipped("language model timed out".to_string());
            }
        };

        let Some(verdict) = parse_semantic_verdict(&text) else {
            return LayerOutcome::PassedWithWarnings(vec![ValidationWarning::new(
                ValidationLayer::Semantic,
                "semantic_unparseable",
                "semantic check response could not be parsed; treating as advisory pass",
            )]);
        };

        if verdict.consistent {
            return LayerOutcome::Passed;
        }

        let message = if verdict.issues.is_empty() {
            format!("workflow is inconsistent with the goal: {goal}")
        } else {
            format!(
                "workflow is inconsistent with the goal: {}",
                verdict.issues.join("; ")
            )
        };

        if verdict.confidence >= self.semantic.error_confidence_threshold {
            LayerOutcome::Failed(vec![ValidationError::new(
                ValidationLayer::Semantic,
                "semantic_inconsistency",
                message,
            )])
        } else {
            LayerOutcome::PassedWithWarnings(vec![ValidationWarning::new(
                ValidationLayer::Semantic,
                "semantic_inconsistency",
                message,
            )])
        }
    }

    // Layer 6: platform dry-run acceptance. Always fatal on rejection.
    async fn check_dry_run(&self, draft: &WorkflowDraft) -> LayerOutcome {
        let report =
            tokio::time::timeout(self.layer_timeout, self.dry_runner.submit(draft)).await;
        let report = match report {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                return LayerOutcome::Failed(vec![ValidationError::new(
                    ValidationLayer::DryRun,
                    "dry_run_unavailable",
                    format!("dry-run collaborator failed: {e}"),
                )]);
            }
            Err(_) => {
                return LayerOutcome::Failed(vec![ValidationError::new(
                    ValidationLayer::DryRun,
                    "dry_run_unavailable",
                    "dry-run collaborator timed out",
                )]);
            }
        };

        if report.accepted {
            return LayerOutcome::Passed;
        }

        let errors = if report.diagnostics.is_empty() {
            vec![ValidationError::new(
                ValidationLayer::DryRun,
                "dry_run_rejected",
                "platform rejected the workflow draft",
            )]
        } else {
            report
                .diagnostics
                .into_iter()
                .map(|diagnostic| {
                    ValidationError::new(ValidationLayer::DryRun, "dry_run_rejected", diagnostic)
                })
                .collect()
        };
        LayerOutcome::Failed(errors)
    }
}

/// Model verdict shape for the semantic layer.
#[derive(Debug, Deserialize)]
struct SemanticVerdict {
    consistent: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    issues: Vec<String>,
}

fn semantic_prompt(draft: &WorkflowDraft, goal: &str) -> String {
    let nodes: Vec<String> = draft
        .nodes
        .iter()
        .map(|n| format!("- {} ({})", n.name, n.node_type))
        .collect();
    let connections: Vec<String> = draft
        .connections
        .iter()
        .map(|c| format!("- {} -> {}", c.from, c.to))
        .collect();
    format!(
        "You are reviewing an automation workflow draft against the user's goal.\n\
         Goal: {goal}\n\nNodes:\n{}\n\nConnections:\n{}\n\n\
         Does the workflow logically accomplish the goal? Respond with JSON only:\n\
         {{\"consistent\": true|false, \"confidence\": 0.0-1.0, \"issues\": [\"...\"]}}",
        nodes.join("\n"),
        connections.join("\n"),
    )
}

/// Extract the first JSON object from a model response and parse it.
fn parse_semantic_verdict(text: &str) -> Option<SemanticVerdict> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// DFS cycle detection over the draft's connection graph.
///
/// Returns the cycle path (node names, first node repeated at the end)
/// when one exists.
fn find_cycle(draft: &WorkflowDraft) -> Option<Vec<String>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for connection in &draft.connections {
        adjacency
            .entry(connection.from.as_str())
            .or_default()
            .push(connection.to.as_str());
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        adjacency: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|s| (*s).to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            None => {}
        }

        marks.insert(node, Mark::Visiting);
        path.push(node);
        if let Some(next) = adjacency.get(node) {
            for &target in next {
                if let Some(cycle) = visit(target, adjacency, marks, path) {
                    return Some(cycle);
                }
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    let mut path = Vec::new();
    for node in draft.nodes.iter().map(|n| n.name.as_str()) {
        if let Some(cycle) = visit(node, &adjacency, &mut marks, &mut path) {
            return Some(cycle);
        }
    }
    None
}
