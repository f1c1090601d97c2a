//! Status reconciler
//!
//! Polls the service on a fixed cadence and rebuilds light and control state
//! from each snapshot. The snapshot is authoritative: it overwrites whatever
//! intents concluded locally, including ownership the server revoked on its
//! own.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::identity::ClientIdentity;
use crate::monitor::{ConnectivityMonitor, ProbeOutcome};
use crate::service::StatusSnapshot;
use crate::state::{ClientState, ControlState};

/// Default polling cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Derive this client's control state and status text from a snapshot.
///
/// Priority: owner, then queue member, then neither.
pub fn derive_control(identity: &ClientIdentity, snapshot: &StatusSnapshot) -> (ControlState, String) {
    if snapshot
        .current_user
        .as_deref()
        .is_some_and(|owner| identity.matches(owner))
    {
        let status = match snapshot.time_remaining {
            Some(secs) => format!("You have control ({}s remaining)", secs),
            None => "You have control".to_string(),
        };
        return (
            ControlState::Owned {
                time_remaining: snapshot.time_remaining,
            },
            status,
        );
    }

    if let Some(position) = snapshot.queue_position(identity.as_str()) {
        return (
            ControlState::Queued {
                position: Some(position),
            },
            format!("In queue (position {})", position),
        );
    }

    let status = if snapshot.current_user.is_some() {
        "Someone else has control"
    } else {
        "Control available"
    };
    (ControlState::Uncontrolled, status.to_string())
}

/// Overwrite light and control state from `snapshot`.
pub(crate) fn reconcile(state: &mut ClientState, snapshot: &StatusSnapshot) {
    state.lights = snapshot.lights.clone();

    let (control, status_line) = derive_control(&state.identity, snapshot);
    if state.control.is_owned() && !control.is_owned() {
        info!(user_id = %state.identity, "Control no longer held according to server");
    } else if !state.control.is_owned() && control.is_owned() {
        info!(user_id = %state.identity, "Server confirms control");
    }
    state.control = control;
    state.status_line = status_line;
}

/// Periodic status poller.
pub struct StatusReconciler {
    monitor: Arc<ConnectivityMonitor>,
    interval: Duration,
}

impl StatusReconciler {
    pub fn new(monitor: Arc<ConnectivityMonitor>, interval: Duration) -> Self {
        Self { monitor, interval }
    }

    /// Probe once and reconcile the snapshot.
    ///
    /// Returns whether a snapshot was applied. The snapshot and the
    /// transition to connected land together. A failed probe has already
    /// forced the client offline when this returns `Connectivity`.
    pub async fn poll_once(&self) -> Result<bool> {
        match self.monitor.probe(reconcile).await {
            ProbeOutcome::Connected(_) => Ok(true),
            ProbeOutcome::Disconnected { reason } => Err(ClientError::Connectivity(reason)),
            ProbeOutcome::Stale => Ok(false),
        }
    }

    /// Start polling: once immediately, then every interval.
    ///
    /// Polls never overlap; a tick that fires while a poll is running is skipped.
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));
        PollerHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    async fn run(self: Arc<Self>, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval = ?self.interval, "Status poller started");

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = &mut shutdown_rx => break,
                        result = self.poll_once() => {
                            if let Err(e) = result {
                                debug!(error = %e, "Status poll failed");
                            }
                        }
                    }
                }
            }
        }

        info!("Status poller stopped");
    }
}

/// Handle to a running poller. Dropping it also stops the poller.
pub struct PollerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop polling and wait for the task to exit, aborting it if it lingers.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Status poller terminated abnormally"),
                Err(_) => {
                    warn!("Status poller did not stop in time; aborting");
                    task.abort();
                }
            }
        }
    }
}
