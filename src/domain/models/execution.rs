//! Pipeline execution lifecycle and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GraphInsight, Pattern, ValidationResult, WorkflowDraft};

/// Terminal-forward execution status: running -> succeeded | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Pattern,
    GraphQuery,
    Generation,
    Validation,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::GraphQuery => "graph_query",
            Self::Generation => "generation",
            Self::Validation => "validation",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wall-clock duration of one completed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub duration_ms: u64,
}

/// Per-stage timing statistics for one execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    pub stage_durations: Vec<StageTiming>,
    pub total_duration_ms: u64,
}

impl PipelineStats {
    pub fn record(&mut self, stage: PipelineStage, duration_ms: u64) {
        self.stage_durations.push(StageTiming { stage, duration_ms });
    }

    pub fn duration_of(&self, stage: PipelineStage) -> Option<u64> {
        self.stage_durations
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.duration_ms)
    }
}

/// A structured stage failure surfaced in the pipeline result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: PipelineStage,
    pub message: String,
}

impl StageError {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// One end-to-end run for a goal. Mutated only by the orchestrator;
/// terminal on success or failure, never reopened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineExecution {
    pub id: Uuid,
    pub goal: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failed_stage: Option<PipelineStage>,
}

impl PipelineExecution {
    pub fn new(goal: impl Into<String>) -> DomainResult<Self> {
        let goal = goal.into();
        if goal.trim().is_empty() {
            return Err(DomainError::EmptyGoal);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            goal,
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            failed_stage: None,
        })
    }

    /// Transition to succeeded. Only legal from running.
    pub fn succeed(&mut self) -> DomainResult<()> {
        self.transition(ExecutionStatus::Succeeded, None)
    }

    /// Transition to failed, recording the failing stage.
    pub fn fail(&mut self, stage: PipelineStage) -> DomainResult<()> {
        self.transition(ExecutionStatus::Failed, Some(stage))
    }

    fn transition(
        &mut self,
        to: ExecutionStatus,
        failed_stage: Option<PipelineStage>,
    ) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: "execution already terminal".to_string(),
            });
        }
        self.status = to;
        self.failed_stage = failed_stage;
        self.finished_at = Some(Utc::now());
        Ok(())
    }
}

/// The single structured result every `execute` call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub execution_id: Uuid,
    pub goal: String,
    pub success: bool,
    pub workflow: Option<WorkflowDraft>,
    pub validation: Option<ValidationResult>,
    pub pattern: Option<Pattern>,
    pub insight: Option<GraphInsight>,
    pub stats: PipelineStats,
    pub errors: Vec<StageError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_goal_rejected() {
        assert!(matches!(
            PipelineExecution::new("   "),
            Err(DomainError::EmptyGoal)
        ));
    }

    #[test]
    fn test_forward_only_transitions() {
        let mut exec = PipelineExecution::new("send a slack message").unwrap();
        assert_eq!(exec.status, ExecutionStatus::Running);

        exec.succeed().unwrap();
        assert_eq!(exec.status, ExecutionStatus::Succeeded);
        assert!(exec.finished_at.is_some());

        // Terminal executions are never reopened.
        assert!(exec.fail(PipelineStage::Pattern).is_err());
        assert!(exec.succeed().is_err());
    }

    #[test]
    fn test_failed_records_stage() {
        let mut exec = PipelineExecution::new("goal").unwrap();
        exec.fail(PipelineStage::Generation).unwrap();
        assert_eq!(exec.status, ExecutionStatus::Failed);
        assert_eq!(exec.failed_stage, Some(PipelineStage::Generation));
    }

    #[test]
    fn test_stats_record_and_lookup() {
        let mut stats = PipelineStats::default();
        stats.record(PipelineStage::Pattern, 12);
        stats.record(PipelineStage::Validation, 40);

        assert_eq!(stats.duration_of(PipelineStage::Pattern), Some(12));
        assert_eq!(stats.duration_of(PipelineStage::Generation), None);
    }
}
