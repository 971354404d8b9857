//! Anthropic Messages API language-model capability.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::LanguageModelConfig;
use crate::domain::ports::{ChatMessage, ChatRole, GenerateOptions, LanguageModel};

const ANTHROPIC_API_VERSION: &str = "2023-06-01";

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct AnthropicLanguageModel {
    client: reqwest::Client,
    config: LanguageModelConfig,
    limiter: DirectLimiter,
}

impl AnthropicLanguageModel {
    pub fn new(config: LanguageModelConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::capability("language_model", e))?;

        let per_minute = NonZeroU32::new(config.requests_per_minute.max(1))
            .unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_minute(per_minute));

        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    async fn messages(
        &self,
        system: Option<String>,
        messages: Vec<ApiMessage>,
        options: &GenerateOptions,
    ) -> DomainResult<String> {
        let Some(api_key) = &self.config.api_key else {
            return Err(DomainError::capability(
                "language_model",
                "no API key configured",
            ));
        };

        self.limiter.until_ready().await;

        let request = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: options.max_tokens,
            system,
            messages,
            temperature: Some(options.temperature),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::capability("language_model", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::capability(
                "language_model",
                format!("API returned {status}: {body}"),
            ));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| DomainError::capability("language_model", e))?;

        parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
            })
            .ok_or_else(|| {
                DomainError::capability("language_model", "response contained no text block")
            })
    }
}

#[async_trait]
impl LanguageModel for AnthropicLanguageModel {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> DomainResult<String> {
        self.messages(
            None,
            vec![ApiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            options,
        )
        .await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> DomainResult<String> {
        let system = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.clone())
            .reduce(|acc, next| format!("{acc}\n{next}"));

        let api_messages: Vec<ApiMessage> = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| ApiMessage {
                role: match m.role {
                    ChatRole::Assistant => "assistant".to_string(),
                    _ => "user".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        self.messages(system, api_messages, options).await
    }

    async fn embed(&self, _text: &str) -> DomainResult<Vec<f32>> {
        // The Messages API has no embedding endpoint; features depending
        // on embeddings are disabled with this backend.
        Err(DomainError::capability(
            "language_model",
            "embeddings not supported by the anthropic backend",
        ))
    }

    async fn embed_batch(&self, _texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        Err(DomainError::capability(
            "language_model",
            "embeddings not supported by the anthropic backend",
        ))
    }
}

/// A message in the Messages API shape.
#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

/// Request to the Anthropic Messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Content block in a response.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Response from the Anthropic Messages API.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}
