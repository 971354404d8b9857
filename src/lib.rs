//! Flowsmith - Goal-to-Workflow Orchestration Engine
//!
//! Flowsmith turns a natural-language automation goal into a validated,
//! executable workflow graph for a target automation platform, enforcing
//! a security policy over which building-block types may appear in
//! generated output and learning from every execution outcome.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, capability ports, and errors
//! - **Service Layer** (`services`): Policy engine, event bus, shared memory,
//!   validation gateway, pipeline agents, learning component
//! - **Application Layer** (`application`): Pipeline orchestration and the
//!   engine facade exposed to the transport layer
//! - **Infrastructure Layer** (`infrastructure`): Config loading, logging,
//!   SQLite storage, capability adapters
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use flowsmith::application::Engine;
//! use flowsmith::domain::models::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = Engine::from_config(Config::default()).await?;
//!     let result = engine.run_goal("send a Slack message when a webhook is received").await;
//!     assert!(result.success);
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{Engine, EngineStatus, Orchestrator};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, EventTopic, GraphInsight, Pattern, PipelineEvent, PipelineResult, PolicyConfig,
    ValidationLayer, ValidationResult, WorkflowDraft, WorkflowNode,
};
pub use domain::ports::{DryRunner, KnowledgeGraph, LanguageModel, MemoryStore, NodeCatalog};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{EventBus, LearningService, PolicyEngine, SharedMemory, ValidationGateway};
