//! Pipeline agents.
//!
//! Three stateless units, one per pipeline stage, sharing a common
//! capability contract: an optional language model and shared-memory
//! access. The orchestrator selects them at fixed pipeline positions.

use async_trait::async_trait;

pub mod generation_agent;
pub mod pattern_agent;
pub mod validator_agent;

pub use generation_agent::GenerationAgent;
pub use pattern_agent::PatternAgent;
pub use validator_agent::ValidatorAgent;

/// Capability contract shared by all pipeline agents.
#[async_trait]
pub trait PipelineAgent: Send + Sync {
    fn name(&self) -> &'static str;

    /// Shared-memory scope this agent writes under.
    fn memory_scope(&self) -> &'static str;

    /// Whether the agent's optional backing capabilities are live.
    ///
    /// Agents degrade gracefully, so a `false` here never blocks the
    /// pipeline; it only surfaces in the status report.
    async fn is_ready(&self) -> bool {
        true
    }
}
