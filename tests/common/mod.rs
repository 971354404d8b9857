//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

// Not every integration test crate uses every helper.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use flowsmith::domain::errors::DomainResult;
use flowsmith::domain::models::{
    EventBusConfig, EventTopic, PipelineConfig, PipelineEvent, PolicyConfig, SemanticConfig,
};
use flowsmith::domain::ports::{DryRunner, KnowledgeGraph, LanguageModel};
use flowsmith::infrastructure::capabilities::catalog::StaticNodeCatalog;
use flowsmith::infrastructure::capabilities::mock::{
    InMemoryMemoryStore, MockDryRunner, MockKnowledgeGraph,
};
use flowsmith::services::agents::{GenerationAgent, PatternAgent, ValidatorAgent};
use flowsmith::services::event_bus::{EventBus, EventHandler};
use flowsmith::services::policy::PolicyEngine;
use flowsmith::services::shared_memory::SharedMemory;
use flowsmith::services::validation_gateway::ValidationGateway;
use flowsmith::Orchestrator;

/// Create a temporary directory for test isolation
#[allow(dead_code)]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Create a temporary test database path
#[allow(dead_code)]
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let db_path = dir.path().join("test.db");
    (dir, db_path)
}

/// Setup test logging
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Overridable pieces of a test pipeline.
pub struct HarnessOptions {
    pub policy: PolicyConfig,
    pub language_model: Option<Arc<dyn LanguageModel>>,
    pub knowledge_graph: Arc<dyn KnowledgeGraph>,
    pub dry_runner: Arc<dyn DryRunner>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            language_model: None,
            knowledge_graph: Arc::new(MockKnowledgeGraph::empty()),
            dry_runner: Arc::new(MockDryRunner::accepting()),
        }
    }
}

/// A fully wired in-memory pipeline for integration tests.
pub struct TestHarness {
    pub orchestrator: Orchestrator,
    pub bus: Arc<EventBus>,
    pub memory: Arc<SharedMemory>,
}

#[allow(dead_code)]
pub fn harness() -> TestHarness {
    harness_with(HarnessOptions::default())
}

pub fn harness_with(options: HarnessOptions) -> TestHarness {
    let memory = Arc::new(SharedMemory::new(Arc::new(InMemoryMemoryStore::new())));
    let bus = Arc::new(EventBus::new(EventBusConfig::default()));
    let policy = Arc::new(PolicyEngine::new(options.policy));
    let catalog = Arc::new(StaticNodeCatalog::builtin());
    let pipeline_config = PipelineConfig::default();

    let mut gateway = ValidationGateway::new(
        policy,
        catalog.clone(),
        options.dry_runner,
        SemanticConfig::default(),
        &pipeline_config,
    );
    if let Some(model) = &options.language_model {
        gateway = gateway.with_language_model(model.clone());
    }

    let pattern_agent = Arc::new(PatternAgent::new(
        options.language_model.clone(),
        options.knowledge_graph,
        memory.clone(),
    ));
    let generation_agent = Arc::new(GenerationAgent::new(
        options.language_model,
        catalog,
        memory.clone(),
    ));
    let validator_agent = Arc::new(ValidatorAgent::new(Arc::new(gateway), memory.clone()));

    let orchestrator = Orchestrator::new(
        pattern_agent,
        generation_agent,
        validator_agent,
        bus.clone(),
        memory.clone(),
        &pipeline_config,
    );

    TestHarness {
        orchestrator,
        bus,
        memory,
    }
}

/// Event subscriber that records everything it sees.
pub struct RecordingSubscriber {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn topics(&self) -> Vec<EventTopic> {
        self.events().iter().map(|e| e.topic).collect()
    }
}

#[async_trait]
impl EventHandler for RecordingSubscriber {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn handle(&self, event: &PipelineEvent) -> DomainResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
