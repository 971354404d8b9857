//! Language-model port - interface for text generation backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Generation tuning options.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

/// Trait for language-model capability implementations.
///
/// Must degrade gracefully: `is_available() == false` disables only the
/// optional semantic validation layer and agent features that depend on
/// the model, never the rest of the pipeline.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Whether the backend is configured and reachable.
    async fn is_available(&self) -> bool;

    /// Single-prompt completion.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> DomainResult<String>;

    /// Multi-turn chat completion.
    async fn chat(&self, messages: &[ChatMessage], options: &GenerateOptions)
        -> DomainResult<String>;

    /// Embed one text.
    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;

    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>>;
}
