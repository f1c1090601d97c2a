//! Presentation view of the client state
//!
//! Front-ends render a [`ClientView`] and route user intents back through
//! [`LightsClient`](crate::LightsClient). Nothing here mutates state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::{ClientState, ConnectivityState, ControlState, LightId};

/// One interactive element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordance {
    pub visible: bool,
    pub enabled: bool,
}

impl Affordance {
    fn new(visible: bool, enabled: bool) -> Self {
        Self {
            visible,
            enabled: visible && enabled,
        }
    }
}

/// Which interactions are currently offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordances {
    pub request_control: Affordance,
    pub release_control: Affordance,
    pub leave_queue: Affordance,
    pub lights: Affordance,
    pub songs: Affordance,
}

impl Affordances {
    /// Everything mutating is disabled unless connected; the rest follows control.
    pub fn derive(connectivity: &ConnectivityState, control: &ControlState) -> Self {
        let connected = connectivity.is_connected();
        let owned = control.is_owned();
        let queued = control.is_queued();

        Self {
            request_control: Affordance::new(!owned, connected),
            release_control: Affordance::new(owned, connected),
            leave_queue: Affordance::new(queued, connected),
            lights: Affordance::new(true, connected && owned),
            songs: Affordance::new(true, connected && owned),
        }
    }

    /// Whether any mutating interaction is enabled.
    pub fn any_enabled(&self) -> bool {
        [
            self.request_control,
            self.release_control,
            self.leave_queue,
            self.lights,
            self.songs,
        ]
        .iter()
        .any(|a| a.enabled)
    }
}

/// Immutable projection of [`ClientState`] for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientView {
    pub user_id: String,
    pub connectivity: ConnectivityState,
    pub control: ControlState,
    /// Every panel light, including ones the server has not reported yet
    pub lights: BTreeMap<LightId, bool>,
    pub status_line: String,
    pub error_banner: Option<String>,
    pub affordances: Affordances,
}

impl ClientView {
    pub fn from_state(state: &ClientState) -> Self {
        let lights = (1..=state.light_count)
            .map(|id| (id, state.lights.get(&id).copied().unwrap_or(false)))
            .collect();

        Self {
            user_id: state.identity.to_string(),
            connectivity: state.connectivity.clone(),
            control: state.control.clone(),
            lights,
            status_line: state.status_line.clone(),
            error_banner: state.error_banner.clone(),
            affordances: Affordances::derive(&state.connectivity, &state.control),
        }
    }
}
