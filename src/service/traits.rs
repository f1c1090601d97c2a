//! Core trait for the light service.

use async_trait::async_trait;

use super::types::{Command, CommandReply, HealthReport, StatusSnapshot};

/// Errors raised by a [`LightsService`] call.
///
/// These carry no timeout variant: deadlines are applied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Server answered with a non-success status
    #[error("HTTP {status}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::InvalidResponse(e.to_string())
        } else {
            ServiceError::Network(e.to_string())
        }
    }
}

/// The remote light panel service.
///
/// One method per endpoint family; the mutating endpoints share [`send`](Self::send).
#[async_trait]
pub trait LightsService: Send + Sync {
    /// `GET /` liveness check.
    async fn ping(&self) -> Result<(), ServiceError>;

    /// `GET /health` readiness check.
    async fn health(&self) -> Result<HealthReport, ServiceError>;

    /// `GET /status` aggregate snapshot.
    async fn status(&self) -> Result<StatusSnapshot, ServiceError>;

    /// Issue a mutating command.
    async fn send(&self, command: &Command) -> Result<CommandReply, ServiceError>;
}
