//! Wire types for the light service API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::LightId;

/// Readiness payload from `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Whether the GPIO hardware can be driven
    #[serde(default)]
    pub gpio_available: bool,
}

/// Error payload carried by non-success responses
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Aggregate status from `GET /status`, authoritative at the instant it was taken.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Every light's on/off state, keyed by 1-based light id
    pub lights: BTreeMap<LightId, bool>,

    /// Identity currently holding control
    #[serde(default)]
    pub current_user: Option<String>,

    /// Identities waiting for control, head first
    #[serde(default)]
    pub queue: Vec<String>,

    /// Seconds left before the server revokes the current owner's control.
    /// Servers send `null` while nobody holds control.
    #[serde(default)]
    pub time_remaining: Option<f64>,
}

impl StatusSnapshot {
    /// 1-based queue position of `user_id`, if queued.
    pub fn queue_position(&self, user_id: &str) -> Option<usize> {
        self.queue.iter().position(|u| u == user_id).map(|i| i + 1)
    }
}

/// Arbitration action for `POST /control`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Acquire,
    Release,
    LeaveQueue,
}

/// HTTP method of a mutating command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Put,
}

/// A mutating request. Every variant carries the caller's identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Control {
        user_id: String,
        action: ControlAction,
    },
    ToggleLight {
        user_id: String,
        light: LightId,
    },
    PlaySong {
        user_id: String,
        song: String,
    },
}

#[derive(Serialize)]
struct ControlRequest<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    action: ControlAction,
}

#[derive(Serialize)]
struct UserRequest<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
}

impl Command {
    /// Endpoint path relative to the base URL
    pub fn path(&self) -> String {
        match self {
            Command::Control { .. } => "/control".to_string(),
            Command::ToggleLight { light, .. } => format!("/lights/{}", light),
            Command::PlaySong { song, .. } => {
                format!("/lights/play_song/{}", urlencoding::encode(song))
            }
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Command::Control { .. } => Method::Post,
            Command::ToggleLight { .. } | Command::PlaySong { .. } => Method::Put,
        }
    }

    /// JSON request body
    pub fn body(&self) -> serde_json::Value {
        let body = match self {
            Command::Control { user_id, action } => serde_json::to_value(ControlRequest {
                user_id,
                action: *action,
            }),
            Command::ToggleLight { user_id, .. } | Command::PlaySong { user_id, .. } => {
                serde_json::to_value(UserRequest { user_id })
            }
        };
        // Both bodies are plain string maps.
        body.unwrap_or_default()
    }

    pub fn user_id(&self) -> &str {
        match self {
            Command::Control { user_id, .. }
            | Command::ToggleLight { user_id, .. }
            | Command::PlaySong { user_id, .. } => user_id,
        }
    }
}

/// Reply to a mutating command.
///
/// `/lights/play_song` replies carry only a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandReply {
    pub fn success() -> Self {
        Self {
            success: Some(true),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            message: Some(message.into()),
        }
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: None,
            message: Some(message.into()),
        }
    }

    /// True only on an explicit `success: true`.
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    pub fn message_or_default(&self) -> String {
        self.message.clone().unwrap_or_default()
    }
}
