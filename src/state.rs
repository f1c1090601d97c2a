//! Client state shared between intents and the status poller
//!
//! All mutable client state lives in one [`ClientState`] behind
//! [`SharedState`]. The lock is never held across a network call, so every
//! response handler applies as a single step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::{watch, Mutex};

use crate::identity::ClientIdentity;
use crate::view::ClientView;

/// 1-based light index
pub type LightId = u32;

/// On/off state per light
pub type LightState = BTreeMap<LightId, bool>;

/// This client's standing in the arbitration protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlState {
    /// Neither owning nor queued
    Uncontrolled,
    /// Holding control. `time_remaining` is known once a snapshot confirms it.
    Owned { time_remaining: Option<f64> },
    /// Waiting for control. `position` is 1-based, unknown until the next snapshot.
    Queued { position: Option<usize> },
}

impl ControlState {
    pub fn is_owned(&self) -> bool {
        matches!(self, ControlState::Owned { .. })
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, ControlState::Queued { .. })
    }
}

/// Whether the service is known to be reachable and ready
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityState {
    /// No probe has completed yet
    Unknown,
    Connected,
    Disconnected { reason: String },
}

impl ConnectivityState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectivityState::Connected)
    }
}

/// Position of a request in the order requests were issued.
///
/// Snapshots and disconnects record their ticket as the authority mark;
/// responses to requests issued before the mark are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// All mutable client state.
///
/// Only this crate mutates it; front-ends observe it through [`ClientView`].
#[derive(Debug, Clone)]
pub struct ClientState {
    pub(crate) identity: ClientIdentity,
    pub(crate) light_count: LightId,
    pub(crate) connectivity: ConnectivityState,
    pub(crate) control: ControlState,
    pub(crate) lights: LightState,
    /// Short status text, e.g. "In queue (position 2)"
    pub(crate) status_line: String,
    /// Last connectivity failure, e.g. "Server Error: GPIO not available"
    pub(crate) error_banner: Option<String>,
    next_ticket: u64,
    authority: u64,
}

impl ClientState {
    pub fn new(identity: ClientIdentity, light_count: LightId) -> Self {
        Self {
            identity,
            light_count,
            connectivity: ConnectivityState::Unknown,
            control: ControlState::Uncontrolled,
            lights: LightState::new(),
            status_line: "Connecting...".to_string(),
            error_banner: None,
            next_ticket: 1,
            authority: 0,
        }
    }

    /// Take the next ticket for an outbound request.
    pub(crate) fn issue_ticket(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Whether an authoritative update newer than `ticket` has been applied.
    pub(crate) fn is_superseded(&self, ticket: Ticket) -> bool {
        ticket.0 < self.authority
    }

    /// Record `ticket` as authoritative. Returns false if it is already stale.
    pub(crate) fn claim_authority(&mut self, ticket: Ticket) -> bool {
        if self.is_superseded(ticket) {
            return false;
        }
        self.authority = ticket.0;
        true
    }

    /// Move the authority mark forward to `ticket` unconditionally.
    pub(crate) fn raise_authority(&mut self, ticket: Ticket) {
        self.authority = self.authority.max(ticket.0);
    }

    /// Whether an intent response issued under `ticket` may change local state.
    pub(crate) fn accepts_intent_response(&self, ticket: Ticket) -> bool {
        self.connectivity.is_connected() && !self.is_superseded(ticket)
    }

    pub(crate) fn contains_light(&self, light: LightId) -> bool {
        (1..=self.light_count).contains(&light)
    }

    /// Flip one light; an unknown light counts as off.
    pub(crate) fn flip_light(&mut self, light: LightId) -> bool {
        let entry = self.lights.entry(light).or_insert(false);
        *entry = !*entry;
        *entry
    }
}

/// [`ClientState`] behind an async mutex, publishing a [`ClientView`] on change.
///
/// Control state is only ever written by server verdicts and snapshots:
///
/// ```compile_fail
/// use lights_client::{ClientIdentity, ClientState, ControlState, SharedState};
///
/// let shared = SharedState::new(ClientState::new(ClientIdentity::from("u1"), 11));
/// let _ = shared.update(|s| s.control = ControlState::Owned { time_remaining: None });
/// ```
pub struct SharedState {
    inner: Mutex<ClientState>,
    view_tx: watch::Sender<ClientView>,
}

impl SharedState {
    pub fn new(state: ClientState) -> Self {
        let (view_tx, _) = watch::channel(ClientView::from_state(&state));
        Self {
            inner: Mutex::new(state),
            view_tx,
        }
    }

    /// Apply `f` to the state and publish the resulting view if it changed.
    pub(crate) async fn update<R>(&self, f: impl FnOnce(&mut ClientState) -> R) -> R {
        let mut state = self.inner.lock().await;
        let result = f(&mut state);
        let view = ClientView::from_state(&state);
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
        result
    }

    /// Read from the state without publishing.
    pub(crate) async fn read<R>(&self, f: impl FnOnce(&ClientState) -> R) -> R {
        let state = self.inner.lock().await;
        f(&state)
    }

    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> ClientState {
        self.inner.lock().await.clone()
    }

    /// Latest published view.
    pub fn view(&self) -> ClientView {
        self.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientView> {
        self.view_tx.subscribe()
    }
}
