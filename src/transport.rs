//! Request transport for mutating commands
//!
//! Gates every call on known connectivity, bounds it with the request
//! timeout and classifies failures into [`ClientError`].

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::monitor::{self, REASON_TIMED_OUT};
use crate::service::{Command, CommandReply, LightsService};
use crate::state::{SharedState, Ticket};

/// Default per-request deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A reply together with the ticket its request was issued under
#[derive(Debug, Clone)]
pub struct Delivery {
    pub ticket: Ticket,
    pub reply: CommandReply,
}

/// Sole network entry point for mutating commands.
pub struct Transport {
    service: Arc<dyn LightsService>,
    state: Arc<SharedState>,
    timeout: Duration,
}

impl Transport {
    pub fn new(service: Arc<dyn LightsService>, state: Arc<SharedState>, timeout: Duration) -> Self {
        Self {
            service,
            state,
            timeout,
        }
    }

    /// Send `command` if connected.
    ///
    /// On timeout the request future is dropped, which aborts the in-flight
    /// HTTP call, and the client is forced offline.
    pub async fn call(&self, command: Command) -> Result<Delivery> {
        let ticket = self
            .state
            .update(|s| s.connectivity.is_connected().then(|| s.issue_ticket()))
            .await
            .ok_or(ClientError::Offline)?;

        debug!(path = %command.path(), user_id = command.user_id(), "Calling light service");

        match tokio::time::timeout(self.timeout, self.service.send(&command)).await {
            Ok(Ok(reply)) => Ok(Delivery { ticket, reply }),
            Ok(Err(e)) => {
                warn!(path = %command.path(), error = %e, "Request failed");
                Err(ClientError::Request(e.to_string()))
            }
            Err(_) => {
                warn!(path = %command.path(), timeout = ?self.timeout, "Request timed out");
                self.state
                    .update(|s| monitor::enter_disconnected(s, ticket, REASON_TIMED_OUT))
                    .await;
                Err(ClientError::Timeout)
            }
        }
    }
}
