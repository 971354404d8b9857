//! Node catalog port - interface for the building-block documentation store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

/// A credential a node type may require.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRequirement {
    /// Credential kind (e.g. `slackApi`).
    pub kind: String,
    pub required: bool,
}

/// Catalog metadata for one node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub type_identifier: String,
    pub display_name: String,
    /// Parameters the platform requires on every instance of this type.
    #[serde(default)]
    pub required_parameters: Vec<String>,
    #[serde(default)]
    pub credentials: Vec<CredentialRequirement>,
}

impl NodeMetadata {
    pub fn new(type_identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            type_identifier: type_identifier.into(),
            display_name: display_name.into(),
            required_parameters: Vec::new(),
            credentials: Vec::new(),
        }
    }

    pub fn with_required_parameter(mut self, name: impl Into<String>) -> Self {
        self.required_parameters.push(name.into());
        self
    }

    pub fn with_credential(mut self, kind: impl Into<String>, required: bool) -> Self {
        self.credentials.push(CredentialRequirement {
            kind: kind.into(),
            required,
        });
        self
    }

    /// Credential kinds every instance of this type must declare.
    pub fn required_credentials(&self) -> Vec<&str> {
        self.credentials
            .iter()
            .filter(|c| c.required)
            .map(|c| c.kind.as_str())
            .collect()
    }
}

/// Trait for node catalog capability implementations.
///
/// Backs validation gateway layers 2-4.
#[async_trait]
pub trait NodeCatalog: Send + Sync {
    /// Whether the catalog knows a type identifier.
    async fn exists(&self, type_identifier: &str) -> DomainResult<bool>;

    /// Metadata for a type identifier; `None` when unknown.
    async fn describe(&self, type_identifier: &str) -> DomainResult<Option<NodeMetadata>>;
}
