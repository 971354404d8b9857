//! Domain errors for the flowsmith pipeline.

use thiserror::Error;

/// Domain-level errors that can occur in the flowsmith system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Goal cannot be empty")]
    EmptyGoal,

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Stage {stage} failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("Stage {stage} timed out after {timeout_secs}s")]
    StageTimeout { stage: String, timeout_secs: u64 },

    #[error("Capability {capability} unavailable: {reason}")]
    CapabilityUnavailable { capability: String, reason: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Build a stage failure from any displayable error.
    pub fn stage(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            message: err.to_string(),
        }
    }

    /// Build a capability-unavailable error.
    pub fn capability(capability: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::CapabilityUnavailable {
            capability: capability.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
