//! HTTP client for the platform dry-run collaborator.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::WorkflowDraft;
use crate::domain::ports::{DryRunReport, DryRunner};

pub struct HttpDryRunner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDryRunner {
    pub fn new(base_url: String, timeout_secs: u64) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DomainError::capability("dry_run", e))?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl DryRunner for HttpDryRunner {
    async fn submit(&self, draft: &WorkflowDraft) -> DomainResult<DryRunReport> {
        let response = self
            .client
            .post(format!("{}/dry-run", self.base_url))
            .json(draft)
            .send()
            .await
            .map_err(|e| DomainError::capability("dry_run", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::capability(
                "dry_run",
                format!("collaborator returned {status}"),
            ));
        }

        response
            .json::<DryRunReport>()
            .await
            .map_err(|e| DomainError::capability("dry_run", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::WorkflowNode;

    #[tokio::test]
    async fn test_submit_parses_report() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/dry-run")
            .with_status(200)
            .with_body(r#"{"accepted": false, "diagnostics": ["missing trigger node"]}"#)
            .create_async()
            .await;

        let runner = HttpDryRunner::new(server.url(), 5).unwrap();
        let draft =
            WorkflowDraft::new("wf").with_node(WorkflowNode::new("Slack", "core.slack"));
        let report = runner.submit(&draft).await.unwrap();

        assert!(!report.accepted);
        assert_eq!(report.diagnostics, vec!["missing trigger node"]);
    }

    #[tokio::test]
    async fn test_collaborator_failure_is_capability_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/dry-run")
            .with_status(502)
            .create_async()
            .await;

        let runner = HttpDryRunner::new(server.url(), 5).unwrap();
        let draft = WorkflowDraft::new("wf");
        let result = runner.submit(&draft).await;

        assert!(matches!(
            result,
            Err(DomainError::CapabilityUnavailable { .. })
        ));
    }
}
