//! In-process publish/subscribe bus for pipeline events.
//!
//! Dispatch is a supervised synchronous fan-out: subscribers matching the
//! event's topic run before `publish` returns, each bounded by a timeout,
//! with errors logged and skipped. A failing or slow subscriber never
//! affects other subscribers or the publisher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EventBusConfig, EventTopic, PipelineEvent};

/// A subscriber callback.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Subscriber name for logging.
    fn name(&self) -> &'static str {
        "subscriber"
    }

    async fn handle(&self, event: &PipelineEvent) -> DomainResult<()>;
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

struct Subscription {
    id: SubscriptionId,
    pattern: String,
    handler: Arc<dyn EventHandler>,
}

/// Acknowledgement returned by `publish`.
#[derive(Debug, Clone, Copy)]
pub struct PublishAck {
    /// Sequence number assigned to the event.
    pub sequence: u64,
    /// Subscribers whose pattern matched the topic.
    pub matched: usize,
    /// Handlers that completed successfully.
    pub delivered: usize,
    /// Handlers that errored or timed out (logged and skipped).
    pub failed: usize,
}

/// Central event bus decoupling the pipeline from its observers.
pub struct EventBus {
    subscriptions: RwLock<Vec<Subscription>>,
    sequence: AtomicU64,
    subscriber_timeout: Duration,
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
            subscriber_timeout: Duration::from_millis(config.subscriber_timeout_ms),
        }
    }

    /// Register a handler for a topic pattern (exact topic, `*`, or a
    /// wildcard prefix such as `pattern:*`).
    pub async fn subscribe(
        &self,
        pattern: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.push(Subscription {
            id,
            pattern: pattern.into(),
            handler,
        });
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write().await;
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() < before
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    /// Next sequence number that will be assigned.
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Publish an event to all matching subscribers.
    ///
    /// Never fails: handler errors and timeouts are logged and counted in
    /// the acknowledgement only.
    pub async fn publish(&self, mut event: PipelineEvent) -> PublishAck {
        event.sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

        // Snapshot matching handlers so dispatch does not hold the lock.
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions
                .iter()
                .filter(|s| event.topic.matches(&s.pattern))
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };

        let mut delivered = 0;
        let mut failed = 0;
        for handler in &handlers {
            match tokio::time::timeout(self.subscriber_timeout, handler.handle(&event)).await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::warn!(
                        subscriber = handler.name(),
                        topic = %event.topic,
                        error = %e,
                        "event subscriber failed; skipping"
                    );
                }
                Err(_) => {
                    failed += 1;
                    tracing::warn!(
                        subscriber = handler.name(),
                        topic = %event.topic,
                        timeout_ms = self.subscriber_timeout.as_millis() as u64,
                        "event subscriber timed out; skipping"
                    );
                }
            }
        }

        PublishAck {
            sequence: event.sequence,
            matched: handlers.len(),
            delivered,
            failed,
        }
    }

    /// Convenience: build and publish an event in one call.
    pub async fn publish_from(
        &self,
        topic: EventTopic,
        payload: serde_json::Value,
        source: &str,
    ) -> PublishAck {
        self.publish(PipelineEvent::new(topic, payload, source)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingHandler {
        seen: Mutex<Vec<(EventTopic, u64)>>,
    }

    impl RecordingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn topics(&self) -> Vec<EventTopic> {
            self.seen.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn handle(&self, event: &PipelineEvent) -> DomainResult<()> {
            self.seen.lock().unwrap().push((event.topic, event.sequence));
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn handle(&self, _event: &PipelineEvent) -> DomainResult<()> {
            Err(crate::domain::errors::DomainError::ValidationFailed(
                "boom".to_string(),
            ))
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl EventHandler for SlowHandler {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn handle(&self, _event: &PipelineEvent) -> DomainResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn bus_with_timeout(ms: u64) -> EventBus {
        EventBus::new(EventBusConfig {
            subscriber_timeout_ms: ms,
        })
    }

    #[tokio::test]
    async fn test_sequence_assignment_is_monotonic() {
        let bus = bus_with_timeout(1000);
        let handler = RecordingHandler::new();
        bus.subscribe("*", handler.clone()).await;

        let ack1 = bus
            .publish_from(EventTopic::PipelineStarted, json!({}), "test")
            .await;
        let ack2 = bus
            .publish_from(EventTopic::PipelineCompleted, json!({}), "test")
            .await;

        assert_eq!(ack1.sequence, 0);
        assert_eq!(ack2.sequence, 1);
        assert_eq!(bus.current_sequence(), 2);

        let seen = handler.seen.lock().unwrap();
        assert_eq!(seen[0].1, 0);
        assert_eq!(seen[1].1, 1);
    }

    #[tokio::test]
    async fn test_wildcard_pattern_delivery() {
        let bus = bus_with_timeout(1000);
        let pattern_only = RecordingHandler::new();
        let all = RecordingHandler::new();
        bus.subscribe("pattern:*", pattern_only.clone()).await;
        bus.subscribe("*", all.clone()).await;

        bus.publish_from(EventTopic::PatternDiscovered, json!({}), "test")
            .await;
        bus.publish_from(EventTopic::WorkflowGenerated, json!({}), "test")
            .await;

        assert_eq!(pattern_only.topics(), vec![EventTopic::PatternDiscovered]);
        assert_eq!(
            all.topics(),
            vec![EventTopic::PatternDiscovered, EventTopic::WorkflowGenerated]
        );
    }

    #[tokio::test]
    async fn test_failing_subscriber_is_isolated() {
        let bus = bus_with_timeout(1000);
        let healthy = RecordingHandler::new();
        bus.subscribe("*", Arc::new(FailingHandler)).await;
        bus.subscribe("*", healthy.clone()).await;

        let ack = bus
            .publish_from(EventTopic::PipelineStarted, json!({}), "test")
            .await;

        assert_eq!(ack.matched, 2);
        assert_eq!(ack.delivered, 1);
        assert_eq!(ack.failed, 1);
        assert_eq!(healthy.topics(), vec![EventTopic::PipelineStarted]);
    }

    #[tokio::test]
    async fn test_slow_subscriber_times_out() {
        let bus = bus_with_timeout(50);
        let healthy = RecordingHandler::new();
        bus.subscribe("*", Arc::new(SlowHandler)).await;
        bus.subscribe("*", healthy.clone()).await;

        let ack = bus
            .publish_from(EventTopic::PipelineStarted, json!({}), "test")
            .await;

        assert_eq!(ack.failed, 1);
        assert_eq!(ack.delivered, 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = bus_with_timeout(1000);
        let handler = RecordingHandler::new();
        let id = bus.subscribe("*", handler.clone()).await;

        bus.publish_from(EventTopic::PipelineStarted, json!({}), "test")
            .await;
        assert!(bus.unsubscribe(id).await);
        bus.publish_from(EventTopic::PipelineCompleted, json!({}), "test")
            .await;

        assert_eq!(handler.topics(), vec![EventTopic::PipelineStarted]);
        assert!(!bus.unsubscribe(id).await);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = bus_with_timeout(1000);
        let ack = bus
            .publish_from(EventTopic::PipelineStarted, json!({}), "test")
            .await;
        assert_eq!(ack.matched, 0);
        assert_eq!(ack.delivered, 0);
    }
}
