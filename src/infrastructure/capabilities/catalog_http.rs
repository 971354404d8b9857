//! HTTP client for a remote node catalog.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use reqwest::StatusCode;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{NodeCatalog, NodeMetadata};

pub struct HttpNodeCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNodeCatalog {
    pub fn new(base_url: String, timeout_secs: u64) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DomainError::capability("catalog", e))?;
        Ok(Self { client, base_url })
    }

    fn retry_policy() -> ExponentialBackoff {
        ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..ExponentialBackoff::default()
        }
    }

    /// Fetch a node type's metadata; `None` on 404.
    async fn fetch(&self, type_identifier: &str) -> DomainResult<Option<NodeMetadata>> {
        let metadata = backoff::future::retry(Self::retry_policy(), || async {
            let response = self
                .client
                .get(format!("{}/nodes/{type_identifier}", self.base_url))
                .send()
                .await
                .map_err(|e| backoff::Error::transient(e.to_string()))?;

            match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_server_error() => Err(backoff::Error::transient(format!(
                    "catalog returned {status}"
                ))),
                status if !status.is_success() => Err(backoff::Error::permanent(format!(
                    "catalog returned {status}"
                ))),
                _ => response
                    .json::<NodeMetadata>()
                    .await
                    .map(Some)
                    .map_err(|e| backoff::Error::permanent(e.to_string())),
            }
        })
        .await
        .map_err(|e| DomainError::capability("catalog", e))?;

        Ok(metadata)
    }
}

#[async_trait]
impl NodeCatalog for HttpNodeCatalog {
    async fn exists(&self, type_identifier: &str) -> DomainResult<bool> {
        Ok(self.fetch(type_identifier).await?.is_some())
    }

    async fn describe(&self, type_identifier: &str) -> DomainResult<Option<NodeMetadata>> {
        self.fetch(type_identifier).await
    }
}
