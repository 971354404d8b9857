//! Validation gateway result types.
//!
//! The gateway runs seven ordered, fail-fast layers over a workflow draft.
//! `passed_layers` is always a strict prefix of [`ValidationLayer::ORDERED`];
//! once `failed_layer` is set, no later layer ran.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The fixed seven-layer validation ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLayer {
    /// Layer 0: node-type policy (built-in vs third-party, whitelist).
    Policy,
    /// Layer 1: structural schema of the draft.
    Schema,
    /// Layer 2: node types known to the catalog.
    Existence,
    /// Layer 3: connection integrity (no dangling edges, optionally acyclic).
    Connections,
    /// Layer 4: required credentials declared.
    Credentials,
    /// Layer 5: optional model-backed goal consistency check.
    Semantic,
    /// Layer 6: platform dry-run acceptance.
    DryRun,
}

impl ValidationLayer {
    /// All layers in execution order.
    pub const ORDERED: [ValidationLayer; 7] = [
        Self::Policy,
        Self::Schema,
        Self::Existence,
        Self::Connections,
        Self::Credentials,
        Self::Semantic,
        Self::DryRun,
    ];

    pub fn index(self) -> usize {
        Self::ORDERED.iter().position(|l| *l == self).unwrap_or(0)
    }

    /// Layers 0-4 are cheap structural checks; 5-6 call collaborators.
    pub fn is_structural(self) -> bool {
        !matches!(self, Self::Semantic | Self::DryRun)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Schema => "schema",
            Self::Existence => "existence",
            Self::Connections => "connections",
            Self::Credentials => "credentials",
            Self::Semantic => "semantic",
            Self::DryRun => "dry_run",
        }
    }
}

impl std::fmt::Display for ValidationLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single validation error, attributed to the layer that raised it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub layer: ValidationLayer,
    /// Stable machine-readable code (e.g. `blocked_node_type`).
    pub code: String,
    pub message: String,
    /// Node types rejected by the policy layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_types: Vec<String>,
    /// Suggested built-in replacements, keyed by blocked type.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub alternatives: HashMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new(layer: ValidationLayer, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            layer,
            code: code.into(),
            message: message.into(),
            blocked_types: Vec::new(),
            alternatives: HashMap::new(),
        }
    }

    pub fn with_blocked_type(
        mut self,
        node_type: impl Into<String>,
        alternatives: Vec<String>,
    ) -> Self {
        let node_type = node_type.into();
        if !alternatives.is_empty() {
            self.alternatives.insert(node_type.clone(), alternatives);
        }
        self.blocked_types.push(node_type);
        self
    }
}

/// A non-fatal advisory finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub layer: ValidationLayer,
    pub code: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(layer: ValidationLayer, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            layer,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Outcome of one gateway invocation. Produced exactly once, immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Strict prefix of [`ValidationLayer::ORDERED`], in run order.
    pub passed_layers: Vec<ValidationLayer>,
    pub failed_layer: Option<ValidationLayer>,
    /// Layers legitimately skipped (semantic layer without a model).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_layers: Vec<ValidationLayer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationWarning>,
    pub duration_ms: u64,
}

impl ValidationResult {
    /// Errors raised by a specific layer.
    pub fn errors_for(&self, layer: ValidationLayer) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.layer == layer).collect()
    }

    /// All blocked node types reported by the policy layer.
    pub fn blocked_types(&self) -> Vec<&str> {
        self.errors
            .iter()
            .flat_map(|e| e.blocked_types.iter().map(String::as_str))
            .collect()
    }
}
