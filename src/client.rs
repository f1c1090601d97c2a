//! Top-level client
//!
//! Owns one identity and one shared state, and hands both to the transport,
//! monitor, arbitration client and reconciler. Front-ends talk to this type
//! only.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::arbitration::{ControlClient, IntentOutcome};
use crate::config::Config;
use crate::error::Result;
use crate::identity::ClientIdentity;
use crate::monitor::ConnectivityMonitor;
use crate::reconciler::{PollerHandle, StatusReconciler};
use crate::service::{HttpLightsService, LightsService, ServiceError};
use crate::state::{ClientState, LightId, SharedState};
use crate::transport::Transport;
use crate::view::ClientView;

pub struct LightsClient {
    identity: ClientIdentity,
    state: Arc<SharedState>,
    control: ControlClient,
    reconciler: Arc<StatusReconciler>,
    songs: Vec<String>,
}

impl LightsClient {
    /// Build a client against an arbitrary service implementation.
    pub fn new(config: &Config, service: Arc<dyn LightsService>, identity: ClientIdentity) -> Self {
        let timeout = config.request_timeout();
        let state = Arc::new(SharedState::new(ClientState::new(
            identity.clone(),
            config.panel.light_count,
        )));

        let transport = Arc::new(Transport::new(service.clone(), state.clone(), timeout));
        let control = ControlClient::new(identity.clone(), state.clone(), transport);
        let monitor = Arc::new(ConnectivityMonitor::new(service, state.clone(), timeout));
        let reconciler = Arc::new(StatusReconciler::new(monitor, config.poll_interval()));

        Self {
            identity,
            state,
            control,
            reconciler,
            songs: config.panel.songs.clone(),
        }
    }

    /// Build a client talking HTTP to `config.service.base_url`.
    pub fn from_config(
        config: &Config,
        identity: ClientIdentity,
    ) -> std::result::Result<Self, ServiceError> {
        let service = HttpLightsService::new(config.service.base_url.clone())?;
        info!(base_url = %config.service.base_url, user_id = %identity, "Light service client ready");
        Ok(Self::new(config, Arc::new(service), identity))
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn songs(&self) -> &[String] {
        &self.songs
    }

    /// Latest published view.
    pub fn view(&self) -> ClientView {
        self.state.view()
    }

    /// Receive every view change.
    pub fn subscribe(&self) -> watch::Receiver<ClientView> {
        self.state.subscribe()
    }

    pub async fn request_control(&self) -> Result<IntentOutcome> {
        self.control.request_control().await
    }

    pub async fn release_control(&self) -> Result<IntentOutcome> {
        self.control.release_control().await
    }

    pub async fn leave_queue(&self) -> Result<IntentOutcome> {
        self.control.leave_queue().await
    }

    pub async fn toggle_light(&self, light: LightId) -> Result<IntentOutcome> {
        self.control.toggle_light(light).await
    }

    pub async fn play_song(&self, song: &str) -> Result<IntentOutcome> {
        self.control.play_song(song).await
    }

    /// Probe and reconcile once. Returns whether a snapshot was applied.
    pub async fn poll_once(&self) -> Result<bool> {
        self.reconciler.poll_once().await
    }

    /// Start the periodic poller; the first poll runs immediately.
    pub fn start_polling(&self) -> PollerHandle {
        self.reconciler.clone().spawn()
    }
}
