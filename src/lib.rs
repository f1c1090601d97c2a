//! lights-client: arbitration client for a shared bank of GPIO lights
//!
//! Several clients compete for exclusive control of a light panel exposed by a
//! remote HTTP service. The service owns arbitration, queueing and timeouts;
//! this crate keeps a local belief of ownership and light state and reconciles
//! it against the server on a fixed polling cadence:
//! - Identity: anonymous per-process client id
//! - Transport: timeout envelope and connectivity gate for mutating calls
//! - Monitor: liveness / readiness / status probe
//! - Arbitration: acquire, release, leave-queue, light and song commands
//! - Reconciler: periodic poll that overwrites local state from the snapshot
//!
//! [`LightsClient`] wires these together and publishes a [`ClientView`] for
//! whatever front-end renders it.

pub mod arbitration;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod monitor;
pub mod reconciler;
pub mod service;
pub mod state;
pub mod transport;
pub mod view;

pub use arbitration::{ControlClient, IntentOutcome};
pub use client::LightsClient;
pub use config::{Config, ConfigError};
pub use error::{ClientError, Result};
pub use identity::ClientIdentity;
pub use monitor::ConnectivityMonitor;
pub use reconciler::{PollerHandle, StatusReconciler};
pub use service::{HttpLightsService, LightsService, MockLightsService, ServiceError};
pub use state::{ClientState, ConnectivityState, ControlState, LightId, LightState, SharedState};
pub use view::{Affordance, Affordances, ClientView};
