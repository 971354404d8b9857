//! Configuration model for flowsmith.
//!
//! Loaded once at process start (see `infrastructure::config::ConfigLoader`)
//! and dependency-injected into every component that needs it. The policy
//! section may be hot-reloaded through `PolicyEngine::reload`; all other
//! sections are immutable for the process lifetime.

use serde::{Deserialize, Serialize};

/// Main configuration structure for flowsmith.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Node-type restriction policy.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Pipeline stage behavior.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Semantic validation layer tuning.
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Event bus dispatch tuning.
    #[serde(default)]
    pub event_bus: EventBusConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External capability endpoints.
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,
}

/// Which building-block types may appear in generated workflows.
///
/// Read on every layer-0 policy check; written at most once at startup
/// (or rarely, through the serialized reload path).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyConfig {
    /// Whether non-builtin (third-party/community) types are permitted.
    #[serde(default)]
    pub allow_third_party_types: bool,

    /// When non-empty and third-party types are allowed, only types
    /// matching one of these prefixes pass.
    #[serde(default)]
    pub whitelist_prefixes: Vec<String>,

    /// Prefixes that identify built-in types. Always allowed.
    #[serde(default = "default_builtin_prefixes")]
    pub builtin_prefixes: Vec<String>,
}

fn default_builtin_prefixes() -> Vec<String> {
    vec!["core.".to_string()]
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allow_third_party_types: false,
            whitelist_prefixes: vec![],
            builtin_prefixes: default_builtin_prefixes(),
        }
    }
}

/// Pipeline stage behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Timeout applied to each stage's external calls.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,

    /// Whether the connections layer rejects cyclic graphs.
    #[serde(default = "default_forbid_cycles")]
    pub forbid_cycles: bool,
}

const fn default_stage_timeout_secs() -> u64 {
    60
}

const fn default_forbid_cycles() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout_secs(),
            forbid_cycles: default_forbid_cycles(),
        }
    }
}

/// Semantic validation layer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SemanticConfig {
    /// An inconsistency reported at or above this confidence fails the
    /// semantic layer; below it, the finding is a warning.
    #[serde(default = "default_error_confidence_threshold")]
    pub error_confidence_threshold: f64,
}

const fn default_error_confidence_threshold() -> f64 {
    0.8
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            error_confidence_threshold: default_error_confidence_threshold(),
        }
    }
}

/// Event bus dispatch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventBusConfig {
    /// Per-subscriber handler timeout. A timed-out subscriber is logged
    /// and skipped, never propagated to the publisher.
    #[serde(default = "default_subscriber_timeout_ms")]
    pub subscriber_timeout_ms: u64,
}

const fn default_subscriber_timeout_ms() -> u64 {
    5_000
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            subscriber_timeout_ms: default_subscriber_timeout_ms(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".flowsmith/flowsmith.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rotated log files. Stderr only when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            directory: None,
        }
    }
}

/// External capability endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CapabilitiesConfig {
    /// Language-model backend. Absent API key disables the capability
    /// (semantic layer skipped, agents fall back to heuristics).
    #[serde(default)]
    pub language_model: LanguageModelConfig,

    /// Knowledge-graph collaborator endpoint.
    #[serde(default)]
    pub knowledge_graph: EndpointConfig,

    /// Remote node catalog endpoint. The built-in static catalog is used
    /// when unset.
    #[serde(default)]
    pub catalog: EndpointConfig,

    /// Dry-run collaborator endpoint.
    #[serde(default)]
    pub dry_run: EndpointConfig,
}

/// Language-model backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LanguageModelConfig {
    /// API key; read from `FLOWSMITH_CAPABILITIES__LANGUAGE_MODEL__API_KEY`
    /// through the standard config merge.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Client-side request rate limit.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

const fn default_requests_per_minute() -> u32 {
    60
}

const fn default_llm_timeout_secs() -> u64 {
    30
}

impl Default for LanguageModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_anthropic_base_url(),
            requests_per_minute: default_requests_per_minute(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// A generic remote collaborator endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointConfig {
    /// Base URL; the capability is disabled (or falls back to a local
    /// implementation) when unset.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_endpoint_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_endpoint_timeout_secs() -> u64 {
    15
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_endpoint_timeout_secs(),
        }
    }
}
