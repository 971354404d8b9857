//! Event-driven learning component.
//!
//! Subscribes to pipeline and validation events and accumulates derived
//! statistics in shared memory. Fully decoupled from pipeline control
//! flow: it only observes, never blocks or influences an execution.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EventTopic, PipelineEvent};
use crate::services::event_bus::EventHandler;
use crate::services::shared_memory::SharedMemory;

/// Shared-memory scope all learning statistics live under.
pub const LEARNING_SCOPE: &str = "learning";

pub struct LearningService {
    memory: Arc<SharedMemory>,
}

impl LearningService {
    pub fn new(memory: Arc<SharedMemory>) -> Self {
        Self { memory }
    }

    /// Current statistics snapshot (key/value pairs in the learning scope).
    pub async fn snapshot(&self) -> DomainResult<Vec<(String, Value)>> {
        self.memory.list(LEARNING_SCOPE).await
    }

    async fn record_completed(&self, event: &PipelineEvent) -> DomainResult<()> {
        let total = self.memory.increment(LEARNING_SCOPE, "total_runs", 1).await?;
        self.memory
            .increment(LEARNING_SCOPE, "successful_runs", 1)
            .await?;

        if let Some(pattern) = event.payload.get("pattern").and_then(Value::as_str) {
            self.memory
                .increment(LEARNING_SCOPE, &format!("pattern:{pattern}:successes"), 1)
                .await?;
        }

        if let Some(duration) = event.payload.get("duration_ms").and_then(Value::as_u64) {
            self.update_average_duration(total, duration).await?;
        }
        Ok(())
    }

    async fn record_failed(&self, event: &PipelineEvent) -> DomainResult<()> {
        self.memory.increment(LEARNING_SCOPE, "total_runs", 1).await?;
        self.memory.increment(LEARNING_SCOPE, "failed_runs", 1).await?;

        if let Some(stage) = event.payload.get("failed_stage").and_then(Value::as_str) {
            self.memory
                .increment(LEARNING_SCOPE, &format!("stage_failures:{stage}"), 1)
                .await?;
        }
        Ok(())
    }

    async fn record_validation(&self, event: &PipelineEvent, passed: bool) -> DomainResult<()> {
        if passed {
            self.memory
                .increment(LEARNING_SCOPE, "validations_passed", 1)
                .await?;
            return Ok(());
        }

        self.memory
            .increment(LEARNING_SCOPE, "validations_failed", 1)
            .await?;
        if let Some(layer) = event.payload.get("failed_layer").and_then(Value::as_str) {
            self.memory
                .increment(LEARNING_SCOPE, &format!("layer_failures:{layer}"), 1)
                .await?;
        }
        Ok(())
    }

    /// Rolling mean over all completed runs, weighted by run count.
    async fn update_average_duration(&self, total_runs: i64, duration_ms: u64) -> DomainResult<()> {
        let previous = self
            .memory
            .get(LEARNING_SCOPE, "avg_duration_ms")
            .await?
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        let runs = total_runs.max(1) as f64;
        let next = previous + (duration_ms as f64 - previous) / runs;
        self.memory
            .set(LEARNING_SCOPE, "avg_duration_ms", Value::from(next), None)
            .await
    }
}

#[async_trait]
impl EventHandler for LearningService {
    fn name(&self) -> &'static str {
        "learning"
    }

    async fn handle(&self, event: &PipelineEvent) -> DomainResult<()> {
        match event.topic {
            EventTopic::PipelineCompleted => self.record_completed(event).await,
            EventTopic::PipelineFailed => self.record_failed(event).await,
            EventTopic::ValidationCompleted => self.record_validation(event, true).await,
            EventTopic::ValidationFailed => self.record_validation(event, false).await,
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::capabilities::mock::InMemoryMemoryStore;
    use serde_json::json;

    fn learning() -> (LearningService, Arc<SharedMemory>) {
        let memory = Arc::new(SharedMemory::new(Arc::new(InMemoryMemoryStore::new())));
        (LearningService::new(memory.clone()), memory)
    }

    fn event(topic: EventTopic, payload: Value) -> PipelineEvent {
        PipelineEvent::new(topic, payload, "orchestrator")
    }

    #[tokio::test]
    async fn test_completed_run_counts() {
        let (learning, memory) = learning();

        learning
            .handle(&event(
                EventTopic::PipelineCompleted,
                json!({"pattern": "webhook-to-slack", "duration_ms": 120}),
            ))
            .await
            .unwrap();

        assert_eq!(
            memory.get(LEARNING_SCOPE, "total_runs").await.unwrap(),
            Some(json!(1))
        );
        assert_eq!(
            memory.get(LEARNING_SCOPE, "successful_runs").await.unwrap(),
            Some(json!(1))
        );
        assert_eq!(
            memory
                .get(LEARNING_SCOPE, "pattern:webhook-to-slack:successes")
                .await
                .unwrap(),
            Some(json!(1))
        );
    }

    #[tokio::test]
    async fn test_failed_run_records_stage() {
        let (learning, memory) = learning();

        learning
            .handle(&event(
                EventTopic::PipelineFailed,
                json!({"failed_stage": "generation"}),
            ))
            .await
            .unwrap();

        assert_eq!(
            memory.get(LEARNING_SCOPE, "failed_runs").await.unwrap(),
            Some(json!(1))
        );
        assert_eq!(
            memory
                .get(LEARNING_SCOPE, "stage_failures:generation")
                .await
                .unwrap(),
            Some(json!(1))
        );
    }

    #[tokio::test]
    async fn test_validation_failure_records_layer() {
        let (learning, memory) = learning();

        learning
            .handle(&event(
                EventTopic::ValidationFailed,
                json!({"failed_layer": "policy"}),
            ))
            .await
            .unwrap();

        assert_eq!(
            memory
                .get(LEARNING_SCOPE, "layer_failures:policy")
                .await
                .unwrap(),
            Some(json!(1))
        );
    }

    #[tokio::test]
    async fn test_rolling_average_duration() {
        let (learning, memory) = learning();

        for duration in [100u64, 200, 300] {
            learning
                .handle(&event(
                    EventTopic::PipelineCompleted,
                    json!({"duration_ms": duration}),
                ))
                .await
                .unwrap();
        }

        let avg = memory
            .get(LEARNING_SCOPE, "avg_duration_ms")
            .await
            .unwrap()
            .and_then(|v| v.as_f64())
            .unwrap();
        assert!((avg - 200.0).abs() < f64::EPSILON, "avg was {avg}");
    }

    #[tokio::test]
    async fn test_non_terminal_events_ignored() {
        let (learning, memory) = learning();

        learning
            .handle(&event(EventTopic::PatternDiscovered, json!({})))
            .await
            .unwrap();

        assert!(memory
            .get(LEARNING_SCOPE, "total_runs")
            .await
            .unwrap()
            .is_none());
    }
}
