//! Capability adapters: concrete implementations of the domain ports.

pub mod anthropic;
pub mod catalog;
pub mod catalog_http;
pub mod dry_run_http;
pub mod graph_http;
pub mod local;
pub mod mock;

pub use anthropic::AnthropicLanguageModel;
pub use catalog::StaticNodeCatalog;
pub use catalog_http::HttpNodeCatalog;
pub use dry_run_http::HttpDryRunner;
pub use graph_http::HttpKnowledgeGraph;
pub use local::{LocalDryRunner, NullKnowledgeGraph};
