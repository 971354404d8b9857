//! Dry-run port - interface for the platform acceptance check.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::WorkflowDraft;

/// The platform's verdict on a submitted draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DryRunReport {
    pub accepted: bool,
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

impl DryRunReport {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn rejected(diagnostics: Vec<String>) -> Self {
        Self {
            accepted: false,
            diagnostics,
        }
    }
}

/// Trait for dry-run capability implementations.
///
/// Submission is a read-only acceptance check; it must never mutate
/// external state.
#[async_trait]
pub trait DryRunner: Send + Sync {
    async fn submit(&self, draft: &WorkflowDraft) -> DomainResult<DryRunReport>;
}
