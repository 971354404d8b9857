//! End-to-end pipeline integration tests over mock capabilities.

mod common;

use std::sync::Arc;

use flowsmith::domain::models::{
    EventTopic, GraphInsight, PipelineStage, RelatedEntity, ValidationLayer,
};
use flowsmith::infrastructure::capabilities::mock::{MockDryRunner, MockKnowledgeGraph};
use flowsmith::services::learning::{LearningService, LEARNING_SCOPE};

use common::{harness, harness_with, HarnessOptions, RecordingSubscriber};

#[tokio::test]
async fn test_webhook_to_slack_end_to_end() {
    // Policy disallows third-party types; no language model configured.
    let harness = harness();
    let subscriber = RecordingSubscriber::new();
    harness.bus.subscribe("*", subscriber.clone()).await;

    let result = harness
        .orchestrator
        .execute("send a Slack message when a webhook is received")
        .await;

    assert!(result.success, "errors: {:?}", result.errors);

    let pattern = result.pattern.expect("pattern should be present");
    assert!(pattern
        .suggested_types
        .iter()
        .all(|t| t.starts_with("core.")));

    let workflow = result.workflow.expect("workflow should be present");
    assert_eq!(workflow.nodes.len(), 2);
    assert_eq!(workflow.nodes[0].node_type, "core.webhook");
    assert_eq!(workflow.nodes[1].node_type, "core.slack");

    let validation = result.validation.expect("validation should be present");
    assert!(validation.valid);
    assert_eq!(validation.skipped_layers, vec![ValidationLayer::Semantic]);
    assert_eq!(validation.passed_layers.len(), 6);

    let topics = subscriber.topics();
    assert_eq!(
        topics,
        vec![
            EventTopic::PipelineStarted,
            EventTopic::PatternDiscovered,
            EventTopic::PatternGraphQueried,
            EventTopic::WorkflowGenerated,
            EventTopic::ValidationCompleted,
            EventTopic::PipelineCompleted,
        ]
    );
}

#[tokio::test]
async fn test_event_completeness_per_execution() {
    let harness = harness();
    let subscriber = RecordingSubscriber::new();
    harness.bus.subscribe("pipeline:*", subscriber.clone()).await;

    harness.orchestrator.execute("notify slack on webhook").await;
    harness.orchestrator.execute("").await; // rejected goal still completes the event contract

    let topics = subscriber.topics();
    let started = topics
        .iter()
        .filter(|t| **t == EventTopic::PipelineStarted)
        .count();
    let terminal = topics.iter().filter(|t| t.is_terminal()).count();
    assert_eq!(started, 2);
    assert_eq!(terminal, 2);

    // The terminal event is always the last one for each execution.
    for events in subscriber.events().chunks(2) {
        assert_eq!(events[0].topic, EventTopic::PipelineStarted);
        assert!(events[1].topic.is_terminal());
    }
}

#[tokio::test]
async fn test_graph_failure_fails_pipeline_with_structured_result() {
    let harness = harness_with(HarnessOptions {
        knowledge_graph: Arc::new(MockKnowledgeGraph::failing()),
        ..HarnessOptions::default()
    });
    let subscriber = RecordingSubscriber::new();
    harness.bus.subscribe("*", subscriber.clone()).await;

    let result = harness.orchestrator.execute("notify slack on webhook").await;

    assert!(!result.success);
    assert!(result.workflow.is_none());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].stage, PipelineStage::GraphQuery);

    let topics = subscriber.topics();
    assert_eq!(*topics.last().unwrap(), EventTopic::PipelineFailed);
    assert!(!topics.contains(&EventTopic::WorkflowGenerated));
}

#[tokio::test]
async fn test_validation_failure_returns_draft_and_errors() {
    let harness = harness_with(HarnessOptions {
        dry_runner: Arc::new(MockDryRunner::rejecting(vec![
        "platform rejected draft".to_string(),
        ])),
        ..HarnessOptions::default()
    });
    let subscriber = RecordingSubscriber::new();
    harness.bus.subscribe("validation:*", subscriber.clone()).await;

    let result = harness.orchestrator.execute("notify slack on webhook").await;

    assert!(!result.success);
    // The caller still gets the draft and a full diagnostic trail.
    assert!(result.workflow.is_some());
    let validation = result.validation.expect("validation should be present");
    assert_eq!(validation.failed_layer, Some(ValidationLayer::DryRun));
    assert_eq!(subscriber.topics(), vec![EventTopic::ValidationFailed]);
}

#[tokio::test]
async fn test_empty_goal_yields_structured_failure() {
    let harness = harness();
    let result = harness.orchestrator.execute("   ").await;

    assert!(!result.success);
    assert!(result.workflow.is_none());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("empty"));
}

#[tokio::test]
async fn test_graph_insight_flows_into_result() {
    let insight = GraphInsight {
        related_entities: vec![RelatedEntity {
            name: "core.slack".to_string(),
            entity_type: "node".to_string(),
            relevance: 0.9,
        }],
        relationships: vec![],
        summary: "slack usually follows webhooks".to_string(),
    };
    let harness = harness_with(HarnessOptions {
        knowledge_graph: Arc::new(MockKnowledgeGraph::canned(insight)),
        ..HarnessOptions::default()
    });

    let result = harness.orchestrator.execute("notify slack on webhook").await;

    assert!(result.success);
    let insight = result.insight.expect("insight should be present");
    assert_eq!(insight.related_entities.len(), 1);
}

#[tokio::test]
async fn test_learning_accumulates_statistics_across_runs() {
    let harness = harness();
    let learning = Arc::new(LearningService::new(harness.memory.clone()));
    harness.bus.subscribe("pipeline:*", learning.clone()).await;
    harness.bus.subscribe("validation:*", learning).await;

    harness.orchestrator.execute("notify slack on webhook").await;
    harness.orchestrator.execute("email me a report every day").await;
    harness.orchestrator.execute("").await; // failed run

    let get = |key: &str| {
        let memory = harness.memory.clone();
        let key = key.to_string();
        async move { memory.get(LEARNING_SCOPE, &key).await.unwrap() }
    };

    assert_eq!(get("total_runs").await, Some(serde_json::json!(3)));
    assert_eq!(get("successful_runs").await, Some(serde_json::json!(2)));
    assert_eq!(get("failed_runs").await, Some(serde_json::json!(1)));
    assert_eq!(
        get("pattern:webhook-to-slack:successes").await,
        Some(serde_json::json!(1))
    );
    assert!(get("avg_duration_ms").await.is_some());
}

#[tokio::test]
async fn test_stage_timings_are_recorded() {
    let harness = harness();
    let result = harness.orchestrator.execute("notify slack on webhook").await;

    assert!(result.success);
    for stage in [
        PipelineStage::Pattern,
        PipelineStage::GraphQuery,
        PipelineStage::Generation,
        PipelineStage::Validation,
    ] {
        assert!(
            result.stats.duration_of(stage).is_some(),
            "missing timing for {stage}"
        );
    }
}

#[tokio::test]
async fn test_concurrent_executions_are_independent() {
    let harness = Arc::new(harness());

    let mut handles = Vec::new();
    for goal in [
        "send a Slack message when a webhook is received",
        "email me a summary every morning",
        "call an api on a schedule",
        "notify slack on webhook",
    ] {
        let harness = harness.clone();
        handles.push(tokio::spawn(async move {
            harness.orchestrator.execute(goal).await
        }));
    }

    for handle in handles {
        let result = handle.await.expect("task panicked");
        assert!(result.success, "errors: {:?}", result.errors);
    }
}
