//! Control arbitration client
//!
//! Turns user intents into commands and server replies into control state.
//! Ownership and queue membership only change after an explicit server
//! verdict; light toggles are mirrored locally as soon as the server accepts
//! them. Any snapshot applied after a request was issued wins over that
//! request's reply.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::identity::ClientIdentity;
use crate::service::{Command, CommandReply, ControlAction};
use crate::state::{ClientState, ControlState, LightId, SharedState, Ticket};
use crate::transport::{Delivery, Transport};

/// The server's verdict on an intent.
///
/// The verdict is reported even when the matching local transition was
/// discarded because a newer snapshot or a disconnect landed while the
/// request was in flight. [`ClientView`](crate::ClientView) always shows the
/// state that actually applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// Not applicable in the current control state; nothing was sent
    Ignored,
    Acquired,
    /// Acquire refused; the server put us in the queue
    Queued { message: String },
    Released,
    LeftQueue,
    LightToggled { light: LightId },
    /// Server message to show the user
    Message(String),
}

/// Issues arbitration intents for one client identity.
pub struct ControlClient {
    identity: ClientIdentity,
    state: Arc<SharedState>,
    transport: Arc<Transport>,
}

impl ControlClient {
    pub fn new(identity: ClientIdentity, state: Arc<SharedState>, transport: Arc<Transport>) -> Self {
        Self {
            identity,
            state,
            transport,
        }
    }

    /// Ask for control. Refusal places this client in the server's queue.
    pub async fn request_control(&self) -> Result<IntentOutcome> {
        if self.current_control().await.is_owned() {
            return Ok(IntentOutcome::Ignored);
        }

        let Delivery { ticket, reply } = self.send_control(ControlAction::Acquire).await?;
        if reply.is_success() {
            info!(user_id = %self.identity, "Control acquired");
            self.apply(ticket, |s| {
                s.control = ControlState::Owned {
                    time_remaining: None,
                }
            })
            .await;
            Ok(IntentOutcome::Acquired)
        } else {
            let message = reply.message_or_default();
            info!(user_id = %self.identity, %message, "Control refused, queued");
            self.apply(ticket, |s| {
                if !s.control.is_queued() {
                    s.control = ControlState::Queued { position: None };
                }
            })
            .await;
            Ok(IntentOutcome::Queued { message })
        }
    }

    /// Give control back. Only sent while owning.
    pub async fn release_control(&self) -> Result<IntentOutcome> {
        if !self.current_control().await.is_owned() {
            return Ok(IntentOutcome::Ignored);
        }

        let Delivery { ticket, reply } = self.send_control(ControlAction::Release).await?;
        if !reply.is_success() {
            return Err(rejected(&reply));
        }
        info!(user_id = %self.identity, "Control released");
        self.apply(ticket, |s| s.control = ControlState::Uncontrolled).await;
        Ok(IntentOutcome::Released)
    }

    /// Leave the wait queue. Only sent while queued.
    pub async fn leave_queue(&self) -> Result<IntentOutcome> {
        if !self.current_control().await.is_queued() {
            return Ok(IntentOutcome::Ignored);
        }

        let Delivery { ticket, reply } = self.send_control(ControlAction::LeaveQueue).await?;
        if !reply.is_success() {
            return Err(rejected(&reply));
        }
        info!(user_id = %self.identity, "Left queue");
        self.apply(ticket, |s| s.control = ControlState::Uncontrolled).await;
        Ok(IntentOutcome::LeftQueue)
    }

    /// Toggle one light. Silently ignored unless owning control.
    pub async fn toggle_light(&self, light: LightId) -> Result<IntentOutcome> {
        let (owned, known) = self
            .state
            .read(|s| (s.control.is_owned(), s.contains_light(light)))
            .await;
        if !owned {
            return Ok(IntentOutcome::Ignored);
        }
        if !known {
            return Err(ClientError::UnknownLight(light));
        }

        let Delivery { ticket, reply } = self
            .transport
            .call(Command::ToggleLight {
                user_id: self.identity.to_string(),
                light,
            })
            .await?;
        if !reply.is_success() {
            return Err(rejected(&reply));
        }
        self.apply(ticket, |s| {
            let on = s.flip_light(light);
            debug!(light, on, "Light toggled locally");
        })
        .await;
        Ok(IntentOutcome::LightToggled { light })
    }

    /// Play a light sequence. The server's message is returned whatever the verdict.
    pub async fn play_song(&self, song: &str) -> Result<IntentOutcome> {
        if !self.current_control().await.is_owned() {
            return Ok(IntentOutcome::Ignored);
        }

        let Delivery { reply, .. } = self
            .transport
            .call(Command::PlaySong {
                user_id: self.identity.to_string(),
                song: song.to_string(),
            })
            .await?;
        Ok(IntentOutcome::Message(reply.message_or_default()))
    }

    async fn current_control(&self) -> ControlState {
        self.state.read(|s| s.control.clone()).await
    }

    async fn send_control(&self, action: ControlAction) -> Result<Delivery> {
        self.transport
            .call(Command::Control {
                user_id: self.identity.to_string(),
                action,
            })
            .await
    }

    /// Apply a confirmed transition unless a newer snapshot or a disconnect got there first.
    async fn apply(&self, ticket: Ticket, f: impl FnOnce(&mut ClientState)) {
        self.state
            .update(|s| {
                if s.accepts_intent_response(ticket) {
                    f(s);
                } else {
                    debug!(?ticket, "Discarding stale response");
                }
            })
            .await;
    }
}

fn rejected(reply: &CommandReply) -> ClientError {
    let message = reply
        .message
        .clone()
        .unwrap_or_else(|| "Request rejected".to_string());
    warn!(%message, "Light service rejected request");
    ClientError::Application(message)
}
