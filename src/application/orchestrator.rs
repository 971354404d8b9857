//! Four-stage pipeline orchestrator.
//!
//! Drives pattern discovery, knowledge-graph lookup, workflow generation,
//! and validation in strict sequence, publishing a lifecycle event at
//! every transition. Stage errors are caught and converted into the
//! structured result; `execute` never raises past its own boundary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    EventTopic, GraphInsight, Pattern, PipelineConfig, PipelineExecution, PipelineResult,
    PipelineStage, PipelineStats, StageError, ValidationResult, WorkflowDraft,
};
use crate::services::agents::{GenerationAgent, PatternAgent, ValidatorAgent};
use crate::services::event_bus::EventBus;
use crate::services::shared_memory::SharedMemory;

const SOURCE: &str = "orchestrator";
const MEMORY_SCOPE: &str = "orchestrator";

pub struct Orchestrator {
    pattern_agent: Arc<PatternAgent>,
    generation_agent: Arc<GenerationAgent>,
    validator_agent: Arc<ValidatorAgent>,
    event_bus: Arc<EventBus>,
    memory: Arc<SharedMemory>,
    stage_timeout: Duration,
}

/// Mutable state threaded through one `execute` call.
struct RunState {
    execution: PipelineExecution,
    stats: PipelineStats,
    errors: Vec<StageError>,
    pattern: Option<Pattern>,
    insight: Option<GraphInsight>,
    workflow: Option<WorkflowDraft>,
    validation: Option<ValidationResult>,
}

impl Orchestrator {
    pub fn new(
        pattern_agent: Arc<PatternAgent>,
        generation_agent: Arc<GenerationAgent>,
        validator_agent: Arc<ValidatorAgent>,
        event_bus: Arc<EventBus>,
        memory: Arc<SharedMemory>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            pattern_agent,
            generation_agent,
            validator_agent,
            event_bus,
            memory,
            stage_timeout: Duration::from_secs(config.stage_timeout_secs),
        }
    }

    /// Run the full pipeline for a goal.
    ///
    /// Always returns a structured result; exactly one `pipeline:started`
    /// and one terminal event are published per call, the terminal event
    /// last.
    pub async fn execute(&self, goal: &str) -> PipelineResult {
        let total_started = Instant::now();

        let execution = match PipelineExecution::new(goal) {
            Ok(execution) => execution,
            Err(e) => return self.reject_goal(goal, &e).await,
        };

        tracing::info!(execution_id = %execution.id, goal = %execution.goal, "pipeline started");
        self.publish(
            EventTopic::PipelineStarted,
            json!({"execution_id": execution.id, "goal": execution.goal}),
        )
        .await;

        let mut state = RunState {
            execution,
            stats: PipelineStats::default(),
            errors: Vec::new(),
            pattern: None,
            insight: None,
            workflow: None,
            validation: None,
        };

        // Stage 1: pattern discovery.
        let stage_started = Instant::now();
        let pattern = match self
            .run_stage(PipelineStage::Pattern, self.pattern_agent.discover(goal))
            .await
        {
            Ok(pattern) => {
                state
                    .stats
                    .record(PipelineStage::Pattern, elapsed_ms(stage_started));
                self.publish(
                    EventTopic::PatternDiscovered,
                    json!({
                        "execution_id": state.execution.id,
                        "pattern": pattern.name,
                        "confidence": pattern.confidence,
                        "suggested_types": pattern.suggested_types,
                    }),
                )
                .await;
                state.pattern = Some(pattern.clone());
                pattern
            }
            Err(e) => {
                return self
                    .fail(state, PipelineStage::Pattern, e, total_started)
                    .await
            }
        };

        // Stage 2: knowledge-graph lookup.
        let stage_started = Instant::now();
        match self
            .run_stage(PipelineStage::GraphQuery, self.pattern_agent.query_graph(goal))
            .await
        {
            Ok(insight) => {
                state
                    .stats
                    .record(PipelineStage::GraphQuery, elapsed_ms(stage_started));
                self.publish(
                    EventTopic::PatternGraphQueried,
                    json!({
                        "execution_id": state.execution.id,
                        "related_entities": insight.related_entities.len(),
                        "summary": insight.summary,
                    }),
                )
                .await;
                state.insight = Some(insight);
            }
            Err(e) => {
                return self
                    .fail(state, PipelineStage::GraphQuery, e, total_started)
                    .await
            }
        }

        // Stage 3: workflow generation.
        let stage_started = Instant::now();
        let workflow = match self
            .run_stage(
                PipelineStage::Generation,
                self.generation_agent
                    .generate(goal, &pattern, state.insight.as_ref()),
            )
            .await
        {
            Ok(workflow) => {
                state
                    .stats
                    .record(PipelineStage::Generation, elapsed_ms(stage_started));
                self.publish(
                    EventTopic::WorkflowGenerated,
                    json!({
                        "execution_id": state.execution.id,
                        "workflow_id": workflow.id,
                        "workflow": workflow.name,
                        "nodes": workflow.nodes.len(),
                    }),
                )
                .await;
                state.workflow = Some(workflow.clone());
                workflow
            }
            Err(e) => {
                return self
                    .fail(state, PipelineStage::Generation, e, total_started)
                    .await
            }
        };

        // Stage 4: validation.
        let stage_started = Instant::now();
        let validation = match self
            .run_stage(
                PipelineStage::Validation,
                self.validator_agent.validate(&workflow, goal),
            )
            .await
        {
            Ok(validation) => {
                state
                    .stats
                    .record(PipelineStage::Validation, elapsed_ms(stage_started));
                validation
            }
            Err(e) => {
                return self
                    .fail(state, PipelineStage::Validation, e, total_started)
                    .await
            }
        };

        let validation_payload = json!({
            "execution_id": state.execution.id,
            "valid": validation.valid,
            "passed_layers": validation.passed_layers.iter().map(|l| l.as_str()).collect::<Vec<_>>(),
            "failed_layer": validation.failed_layer.map(|l| l.as_str()),
        });
        let validation_topic = if validation.valid {
            EventTopic::ValidationCompleted
        } else {
            EventTopic::ValidationFailed
        };
        self.publish(validation_topic, validation_payload).await;

        if validation.valid {
            state.validation = Some(validation);
            self.complete(state, total_started).await
        } else {
            let failed_layer = validation
                .failed_layer
                .map_or("unknown".to_string(), |l| l.as_str().to_string());
            state.validation = Some(validation);
            let error = DomainError::ValidationFailed(format!(
                "workflow failed validation at layer {failed_layer}"
            ));
            self.fail(state, PipelineStage::Validation, error, total_started)
                .await
        }
    }

    /// Wrap a stage future with the stage timeout.
    async fn run_stage<T>(
        &self,
        stage: PipelineStage,
        fut: impl std::future::Future<Output = DomainResult<T>>,
    ) -> DomainResult<T> {
        match tokio::time::timeout(self.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::StageTimeout {
                stage: stage.as_str().to_string(),
                timeout_secs: self.stage_timeout.as_secs(),
            }),
        }
    }

    async fn complete(&self, mut state: RunState, total_started: Instant) -> PipelineResult {
        state.stats.total_duration_ms = elapsed_ms(total_started);
        if let Err(e) = state.execution.succeed() {
            tracing::error!(execution_id = %state.execution.id, error = %e, "invalid completion transition");
        }

        let pattern_name = state.pattern.as_ref().map(|p| p.name.clone());
        self.record_run(&state, true).await;
        self.publish(
            EventTopic::PipelineCompleted,
            json!({
                "execution_id": state.execution.id,
                "success": true,
                "pattern": pattern_name,
                "duration_ms": state.stats.total_duration_ms,
            }),
        )
        .await;

        tracing::info!(
            execution_id = %state.execution.id,
            duration_ms = state.stats.total_duration_ms,
            "pipeline completed"
        );

        self.into_result(state, true)
    }

    async fn fail(
        &self,
        mut state: RunState,
        stage: PipelineStage,
        error: DomainError,
        total_started: Instant,
    ) -> PipelineResult {
        tracing::warn!(
            execution_id = %state.execution.id,
            stage = %stage,
            error = %error,
            "pipeline stage failed"
        );

        state.stats.total_duration_ms = elapsed_ms(total_started);
        state.errors.push(StageError::new(stage, error.to_string()));
        if let Err(e) = state.execution.fail(stage) {
            tracing::error!(execution_id = %state.execution.id, error = %e, "invalid failure transition");
        }

        self.record_run(&state, false).await;
        self.publish(
            EventTopic::PipelineFailed,
            json!({
                "execution_id": state.execution.id,
                "success": false,
                "failed_stage": stage.as_str(),
                "error": error.to_string(),
                "duration_ms": state.stats.total_duration_ms,
            }),
        )
        .await;

        self.into_result(state, false)
    }

    /// Structured result for a goal rejected before an execution exists.
    async fn reject_goal(&self, goal: &str, error: &DomainError) -> PipelineResult {
        let execution_id = Uuid::new_v4();
        self.publish(
            EventTopic::PipelineStarted,
            json!({"execution_id": execution_id, "goal": goal}),
        )
        .await;
        self.publish(
            EventTopic::PipelineFailed,
            json!({
                "execution_id": execution_id,
                "success": false,
                "failed_stage": PipelineStage::Pattern.as_str(),
                "error": error.to_string(),
            }),
        )
        .await;

        PipelineResult {
            execution_id,
            goal: goal.to_string(),
            success: false,
            workflow: None,
            validation: None,
            pattern: None,
            insight: None,
            stats: PipelineStats::default(),
            errors: vec![StageError::new(PipelineStage::Pattern, error.to_string())],
        }
    }

    /// Best-effort event publication; subscriber outcomes never surface
    /// to the pipeline.
    async fn publish(&self, topic: EventTopic, payload: serde_json::Value) {
        let ack = self.event_bus.publish_from(topic, payload, SOURCE).await;
        if ack.failed > 0 {
            tracing::debug!(topic = %topic, failed = ack.failed, "event subscribers failed");
        }
    }

    /// Record the run summary to shared memory. Independent of event
    /// publication; memory never triggers events.
    async fn record_run(&self, state: &RunState, success: bool) {
        let summary = json!({
            "execution_id": state.execution.id,
            "goal": state.execution.goal,
            "success": success,
            "failed_stage": state.execution.failed_stage.map(|s| s.as_str()),
            "duration_ms": state.stats.total_duration_ms,
        });
        if let Err(e) = self
            .memory
            .set(MEMORY_SCOPE, "last_run", summary, None)
            .await
        {
            tracing::warn!(error = %e, "failed to record run summary");
        }
    }

    fn into_result(&self, state: RunState, success: bool) -> PipelineResult {
        PipelineResult {
            execution_id: state.execution.id,
            goal: state.execution.goal,
            success,
            workflow: state.workflow,
            validation: state.validation,
            pattern: state.pattern,
            insight: state.insight,
            stats: state.stats,
            errors: state.errors,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
