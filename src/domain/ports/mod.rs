//! Domain ports: narrow, swappable capability contracts.

pub mod catalog;
pub mod dry_run;
pub mod knowledge_graph;
pub mod language_model;
pub mod memory_store;

pub use catalog::{CredentialRequirement, NodeCatalog, NodeMetadata};
pub use dry_run::{DryRunReport, DryRunner};
pub use knowledge_graph::{GraphUpdate, KnowledgeGraph};
pub use language_model::{ChatMessage, ChatRole, GenerateOptions, LanguageModel};
pub use memory_store::{MemoryStore, ScopeSummary};
