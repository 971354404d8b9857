//! HTTP client for the knowledge-graph collaborator.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::GraphInsight;
use crate::domain::ports::{GraphUpdate, KnowledgeGraph};

pub struct HttpKnowledgeGraph {
    client: reqwest::Client,
    base_url: String,
}

impl HttpKnowledgeGraph {
    pub fn new(base_url: String, timeout_secs: u64) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DomainError::capability("knowledge_graph", e))?;
        Ok(Self { client, base_url })
    }

    fn retry_policy() -> ExponentialBackoff {
        ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..ExponentialBackoff::default()
        }
    }
}

#[async_trait]
impl KnowledgeGraph for HttpKnowledgeGraph {
    async fn query(&self, text: &str) -> DomainResult<GraphInsight> {
        // Idempotent read; retried with exponential backoff on transient
        // failures, surfaced as a capability error otherwise.
        let insight = backoff::future::retry(Self::retry_policy(), || async {
            let response = self
                .client
                .get(format!("{}/insights", self.base_url))
                .query(&[("query", text)])
                .send()
                .await
                .map_err(|e| backoff::Error::transient(e.to_string()))?;

            let status = response.status();
            if status.is_server_error() {
                return Err(backoff::Error::transient(format!(
                    "graph returned {status}"
                )));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(format!(
                    "graph returned {status}"
                )));
            }

            response
                .json::<GraphInsight>()
                .await
                .map_err(|e| backoff::Error::permanent(e.to_string()))
        })
        .await
        .map_err(|e| DomainError::capability("knowledge_graph", e))?;

        Ok(insight)
    }

    async fn apply_update(&self, update: GraphUpdate) -> DomainResult<()> {
        let response = self
            .client
            .post(format!("{}/updates", self.base_url))
            .json(&update)
            .send()
            .await
            .map_err(|e| DomainError::capability("knowledge_graph", e))?;

        if !response.status().is_success() {
            return Err(DomainError::capability(
                "knowledge_graph",
                format!("update rejected with {}", response.status()),
            ));
        }
        Ok(())
    }

    async fn invalidate_cache(&self) -> DomainResult<()> {
        let response = self
            .client
            .post(format!("{}/cache/invalidate", self.base_url))
            .send()
            .await
            .map_err(|e| DomainError::capability("knowledge_graph", e))?;

        if !response.status().is_success() {
            return Err(DomainError::capability(
                "knowledge_graph",
                format!("cache invalidation rejected with {}", response.status()),
            ));
        }
        Ok(())
    }
}
