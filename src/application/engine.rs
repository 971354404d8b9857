//! Engine facade: wiring and the surface exposed to the transport layer.
//!
//! Construction order matters: shared memory and the event bus are built
//! first and injected into agents and the orchestrator, never the
//! reverse. Memory updates and event publication stay independent writes
//! from the orchestrator; memory never triggers events internally.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::models::{Config, PipelineResult};
use crate::domain::ports::{
    DryRunner, KnowledgeGraph, LanguageModel, NodeCatalog, ScopeSummary,
};
use crate::infrastructure::capabilities::anthropic::AnthropicLanguageModel;
use crate::infrastructure::capabilities::catalog::StaticNodeCatalog;
use crate::infrastructure::capabilities::catalog_http::HttpNodeCatalog;
use crate::infrastructure::capabilities::dry_run_http::HttpDryRunner;
use crate::infrastructure::capabilities::graph_http::HttpKnowledgeGraph;
use crate::infrastructure::capabilities::local::{LocalDryRunner, NullKnowledgeGraph};
use crate::infrastructure::database::connection::{create_pool, PoolConfig};
use crate::infrastructure::database::migrations::{embedded_migrations, Migrator};
use crate::infrastructure::database::memory_store::SqliteMemoryStore;
use crate::services::agents::{GenerationAgent, PatternAgent, PipelineAgent, ValidatorAgent};
use crate::services::event_bus::EventBus;
use crate::services::learning::LearningService;
use crate::services::policy::PolicyEngine;
use crate::services::shared_memory::SharedMemory;
use crate::services::validation_gateway::ValidationGateway;
use crate::application::orchestrator::Orchestrator;

/// Readiness of one agent, for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub name: String,
    pub ready: bool,
}

/// Snapshot returned by `Engine::status`.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub initialized: bool,
    pub agents: Vec<AgentStatus>,
    pub memory_scopes: Vec<MemoryScopeStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryScopeStatus {
    pub scope: String,
    pub entries: u64,
}

impl From<ScopeSummary> for MemoryScopeStatus {
    fn from(summary: ScopeSummary) -> Self {
        Self {
            scope: summary.scope,
            entries: summary.entries,
        }
    }
}

/// The fully wired core, exposing `run_goal` and `status` to whatever
/// transport hosts it.
pub struct Engine {
    orchestrator: Arc<Orchestrator>,
    memory: Arc<SharedMemory>,
    pattern_agent: Arc<PatternAgent>,
    generation_agent: Arc<GenerationAgent>,
    validator_agent: Arc<ValidatorAgent>,
    event_bus: Arc<EventBus>,
}

impl Engine {
    /// Build the engine from configuration: storage first, then bus and
    /// policy, then capabilities, agents, orchestrator, and finally the
    /// learning subscriptions.
    pub async fn from_config(config: Config) -> Result<Self> {
        let database_url = format!("sqlite:{}", config.database.path);
        let pool = create_pool(
            &database_url,
            Some(PoolConfig {
                max_connections: config.database.max_connections,
                ..PoolConfig::default()
            }),
        )
        .await
        .context("failed to open shared memory database")?;
        Migrator::new(pool.clone())
            .run_embedded_migrations(embedded_migrations())
            .await
            .context("failed to run shared memory migrations")?;

        let memory = Arc::new(SharedMemory::new(Arc::new(SqliteMemoryStore::new(pool))));
        let event_bus = Arc::new(EventBus::new(config.event_bus.clone()));
        let policy = Arc::new(PolicyEngine::new(config.policy.clone()));

        let language_model: Option<Arc<dyn LanguageModel>> =
            match &config.capabilities.language_model.api_key {
                Some(_) => {
                    let model =
                        AnthropicLanguageModel::new(config.capabilities.language_model.clone())
                            .context("failed to build language model client")?;
                    Some(Arc::new(model))
                }
                None => {
                    tracing::info!("no language model configured; agents use heuristics");
                    None
                }
            };

        let knowledge_graph: Arc<dyn KnowledgeGraph> =
            match &config.capabilities.knowledge_graph.url {
                Some(url) => Arc::new(HttpKnowledgeGraph::new(
                    url.clone(),
                    config.capabilities.knowledge_graph.timeout_secs,
                )?),
                None => Arc::new(NullKnowledgeGraph),
            };

        let catalog: Arc<dyn NodeCatalog> = match &config.capabilities.catalog.url {
            Some(url) => Arc::new(HttpNodeCatalog::new(
                url.clone(),
                config.capabilities.catalog.timeout_secs,
            )?),
            None => Arc::new(StaticNodeCatalog::builtin()),
        };

        let dry_runner: Arc<dyn DryRunner> = match &config.capabilities.dry_run.url {
            Some(url) => Arc::new(HttpDryRunner::new(
                url.clone(),
                config.capabilities.dry_run.timeout_secs,
            )?),
            None => Arc::new(LocalDryRunner),
        };

        let mut gateway = ValidationGateway::new(
            policy,
            catalog.clone(),
            dry_runner,
            config.semantic.clone(),
            &config.pipeline,
        );
        if let Some(model) = &language_model {
            gateway = gateway.with_language_model(model.clone());
        }

        let pattern_agent = Arc::new(PatternAgent::new(
            language_model.clone(),
            knowledge_graph,
            memory.clone(),
        ));
        let generation_agent = Arc::new(GenerationAgent::new(
            language_model,
            catalog,
            memory.clone(),
        ));
        let validator_agent = Arc::new(ValidatorAgent::new(Arc::new(gateway), memory.clone()));

        let orchestrator = Arc::new(Orchestrator::new(
            pattern_agent.clone(),
            generation_agent.clone(),
            validator_agent.clone(),
            event_bus.clone(),
            memory.clone(),
            &config.pipeline,
        ));

        let learning = Arc::new(LearningService::new(memory.clone()));
        event_bus.subscribe("pipeline:*", learning.clone()).await;
        event_bus.subscribe("validation:*", learning).await;

        Ok(Self {
            orchestrator,
            memory,
            pattern_agent,
            generation_agent,
            validator_agent,
            event_bus,
        })
    }

    /// Run one goal through the pipeline.
    pub async fn run_goal(&self, goal: &str) -> PipelineResult {
        self.orchestrator.execute(goal).await
    }

    /// The bus, for transports that want to attach their own observers
    /// (audit sinks, live progress).
    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    /// Status snapshot for the transport layer.
    pub async fn status(&self) -> Result<EngineStatus> {
        let (pattern_ready, generation_ready, validator_ready) = futures::join!(
            self.pattern_agent.is_ready(),
            self.generation_agent.is_ready(),
            self.validator_agent.is_ready(),
        );

        let memory_scopes = self
            .memory
            .summary()
            .await
            .context("failed to summarize shared memory")?
            .into_iter()
            .map(MemoryScopeStatus::from)
            .collect();

        Ok(EngineStatus {
            initialized: true,
            agents: vec![
                AgentStatus {
                    name: self.pattern_agent.name().to_string(),
                    ready: pattern_ready,
                },
                AgentStatus {
                    name: self.generation_agent.name().to_string(),
                    ready: generation_ready,
                },
                AgentStatus {
                    name: self.validator_agent.name().to_string(),
                    ready: validator_ready,
                },
            ],
            memory_scopes,
        })
    }
}
