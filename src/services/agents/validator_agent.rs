//! Validator agent.
//!
//! Thin wrapper over the validation gateway that records each outcome to
//! shared memory for cross-run inspection.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ValidationResult, WorkflowDraft};
use crate::services::agents::PipelineAgent;
use crate::services::shared_memory::SharedMemory;
use crate::services::validation_gateway::ValidationGateway;

const MEMORY_SCOPE: &str = "validator_agent";

pub struct ValidatorAgent {
    gateway: Arc<ValidationGateway>,
    memory: Arc<SharedMemory>,
}

impl ValidatorAgent {
    pub fn new(gateway: Arc<ValidationGateway>, memory: Arc<SharedMemory>) -> Self {
        Self { gateway, memory }
    }

    pub async fn validate(
        &self,
        draft: &WorkflowDraft,
        goal: &str,
    ) -> DomainResult<ValidationResult> {
        let result = self.gateway.validate(draft, goal).await;

        self.memory
            .set(
                MEMORY_SCOPE,
                "last_result",
                json!({
                    "workflow": draft.name,
                    "valid": result.valid,
                    "failed_layer": result.failed_layer.map(|l| l.as_str()),
                    "passed_layers": result.passed_layers.len(),
                    "duration_ms": result.duration_ms,
                }),
                Some(Duration::hours(1)),
            )
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl PipelineAgent for ValidatorAgent {
    fn name(&self) -> &'static str {
        "validator_agent"
    }

    fn memory_scope(&self) -> &'static str {
        MEMORY_SCOPE
    }
}
