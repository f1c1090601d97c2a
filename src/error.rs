//! Client error types

use thiserror::Error;

use crate::state::LightId;

/// Text shown to the user for every failure that carries no server message.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

/// Errors surfaced by client operations.
///
/// `Offline`, `Timeout` and `Connectivity` have already been applied to the
/// shared state (banner, disabled affordances) by the time the caller sees them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Mutating call attempted while the service is not known to be connected
    #[error("Server is offline")]
    Offline,

    /// Request deadline exceeded; the client has been forced offline
    #[error("Server request timed out")]
    Timeout,

    /// Non-success HTTP status, transport failure or undecodable body
    #[error("Request failed: {0}")]
    Request(String),

    /// HTTP success but the server reported `success: false`
    #[error("{0}")]
    Application(String),

    /// Liveness, readiness or status probe failed
    #[error("Server Error: {0}")]
    Connectivity(String),

    /// Light id outside the configured panel
    #[error("Unknown light: {0}")]
    UnknownLight(LightId),
}

impl ClientError {
    /// Message suitable for the end user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Application(message) => message.clone(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
