//! Connectivity monitor
//!
//! A probe runs three checks in order and stops at the first failure:
//! 1. `GET /` liveness
//! 2. `GET /health` readiness, which must also report `gpio_available`
//! 3. `GET /status` snapshot
//!
//! Only a fully successful probe counts as connected. Falling into the
//! disconnected state drops any ownership or queue belief and disables every
//! mutating affordance.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::service::{LightsService, ServiceError, StatusSnapshot};
use crate::state::{ClientState, ConnectivityState, ControlState, SharedState, Ticket};

pub const REASON_NOT_RESPONDING: &str = "Server not responding";
pub const REASON_HEALTH_FAILED: &str = "Health check failed";
pub const REASON_GPIO_UNAVAILABLE: &str = "GPIO not available";
pub const REASON_STATUS_FAILED: &str = "Status check failed";
pub const REASON_TIMED_OUT: &str = "Server request timed out";

/// Result of the three-step check
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Connected(StatusSnapshot),
    Disconnected { reason: String },
    /// Service was reachable but a newer authoritative update already landed
    Stale,
}

/// Probes service liveness and readiness and keeps connectivity state current.
pub struct ConnectivityMonitor {
    service: Arc<dyn LightsService>,
    state: Arc<SharedState>,
    timeout: Duration,
}

impl ConnectivityMonitor {
    pub fn new(service: Arc<dyn LightsService>, state: Arc<SharedState>, timeout: Duration) -> Self {
        Self {
            service,
            state,
            timeout,
        }
    }

    /// Run the check sequence and apply the resulting connectivity transition.
    ///
    /// On success `on_snapshot` runs under the same lock as the transition to
    /// connected, so no other update can land between the two. It is skipped
    /// when a newer authoritative update has already been applied.
    pub(crate) async fn probe(
        &self,
        on_snapshot: impl FnOnce(&mut ClientState, &StatusSnapshot),
    ) -> ProbeOutcome {
        let ticket = self.state.update(|s| s.issue_ticket()).await;

        match self.check().await {
            ProbeOutcome::Connected(snapshot) => {
                let fresh = self
                    .state
                    .update(|s| {
                        if !s.claim_authority(ticket) {
                            return false;
                        }
                        enter_connected(s);
                        on_snapshot(s, &snapshot);
                        true
                    })
                    .await;
                if fresh {
                    ProbeOutcome::Connected(snapshot)
                } else {
                    debug!(?ticket, "Discarding probe overtaken by a newer update");
                    ProbeOutcome::Stale
                }
            }
            ProbeOutcome::Disconnected { reason } => {
                self.state
                    .update(|s| enter_disconnected(s, ticket, &reason))
                    .await;
                ProbeOutcome::Disconnected { reason }
            }
            ProbeOutcome::Stale => ProbeOutcome::Stale,
        }
    }

    /// The three-step check alone, without touching client state.
    pub(crate) async fn check(&self) -> ProbeOutcome {
        if let Err(reason) = self.step(self.service.ping(), |_| REASON_NOT_RESPONDING.into()).await {
            return ProbeOutcome::Disconnected { reason };
        }

        let health = self
            .step(self.service.health(), |e| match e {
                ServiceError::Status {
                    message: Some(message),
                    ..
                } if !message.is_empty() => message,
                _ => REASON_HEALTH_FAILED.into(),
            })
            .await;
        match health {
            Ok(report) if !report.gpio_available => {
                return ProbeOutcome::Disconnected {
                    reason: REASON_GPIO_UNAVAILABLE.into(),
                };
            }
            Ok(_) => {}
            Err(reason) => return ProbeOutcome::Disconnected { reason },
        }

        match self
            .step(self.service.status(), |_| REASON_STATUS_FAILED.into())
            .await
        {
            Ok(snapshot) => ProbeOutcome::Connected(snapshot),
            Err(reason) => ProbeOutcome::Disconnected { reason },
        }
    }

    /// Bound one check by the request timeout and turn its failure into a reason.
    async fn step<T>(
        &self,
        call: impl Future<Output = Result<T, ServiceError>>,
        reason: impl FnOnce(ServiceError) -> String,
    ) -> Result<T, String> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                debug!(error = %e, "Probe step failed");
                Err(reason(e))
            }
            Err(_) => Err(REASON_TIMED_OUT.into()),
        }
    }
}

/// Mark the service reachable. Clears the failure banner on the transition.
pub(crate) fn enter_connected(state: &mut ClientState) {
    if state.connectivity.is_connected() {
        return;
    }
    info!("Connected to light service");
    state.connectivity = ConnectivityState::Connected;
    state.status_line = "Connected".to_string();
    state.error_banner = None;
}

/// Mark the service unreachable and drop every ownership assumption.
///
/// Always applies; `ticket` becomes the authority mark so responses to
/// requests issued before the failure cannot restore ownership.
pub(crate) fn enter_disconnected(state: &mut ClientState, ticket: Ticket, reason: &str) {
    let was_disconnected = matches!(state.connectivity, ConnectivityState::Disconnected { .. });
    if !was_disconnected {
        warn!(%reason, "Lost connection to light service");
    }

    state.raise_authority(ticket);
    state.connectivity = ConnectivityState::Disconnected {
        reason: reason.to_string(),
    };
    state.control = ControlState::Uncontrolled;
    state.status_line = "Server Offline".to_string();
    state.error_banner = Some(format!("Server Error: {}", reason));
}
