//! Mock light service for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::traits::{LightsService, ServiceError};
use super::types::{Command, CommandReply, HealthReport, StatusSnapshot};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scriptable in-memory light service.
///
/// Probe endpoints return whatever was last set. Command replies are consumed
/// from a FIFO script; an empty script answers `{"success": true}`.
pub struct MockLightsService {
    alive: AtomicBool,
    health: Mutex<Result<HealthReport, ServiceError>>,
    status: Mutex<Result<StatusSnapshot, ServiceError>>,
    replies: Mutex<VecDeque<Result<CommandReply, ServiceError>>>,
    delay: Mutex<Option<Duration>>,
    commands: Mutex<Vec<Command>>,
    ping_count: AtomicU32,
    health_count: AtomicU32,
    status_count: AtomicU32,
}

impl MockLightsService {
    /// A healthy service with an empty, uncontrolled panel.
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            health: Mutex::new(Ok(HealthReport {
                gpio_available: true,
            })),
            status: Mutex::new(Ok(StatusSnapshot::default())),
            replies: Mutex::new(VecDeque::new()),
            delay: Mutex::new(None),
            commands: Mutex::new(Vec::new()),
            ping_count: AtomicU32::new(0),
            health_count: AtomicU32::new(0),
            status_count: AtomicU32::new(0),
        }
    }

    /// Set the status snapshot served by `/status`.
    pub fn with_status(self, snapshot: StatusSnapshot) -> Self {
        self.set_status(snapshot);
        self
    }

    /// Set an artificial latency applied to every call.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(Some(delay));
        self
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    pub fn set_health(&self, result: Result<HealthReport, ServiceError>) {
        *lock(&self.health) = result;
    }

    pub fn set_gpio_available(&self, available: bool) {
        self.set_health(Ok(HealthReport {
            gpio_available: available,
        }));
    }

    pub fn set_status(&self, snapshot: StatusSnapshot) {
        *lock(&self.status) = Ok(snapshot);
    }

    pub fn set_status_error(&self, error: ServiceError) {
        *lock(&self.status) = Err(error);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    /// Queue the reply for the next command.
    pub fn push_reply(&self, reply: Result<CommandReply, ServiceError>) {
        lock(&self.replies).push_back(reply);
    }

    /// Commands received so far, in arrival order.
    pub fn commands(&self) -> Vec<Command> {
        lock(&self.commands).clone()
    }

    pub fn command_count(&self) -> usize {
        lock(&self.commands).len()
    }

    /// Number of `/` probes received.
    pub fn ping_count(&self) -> u32 {
        self.ping_count.load(Ordering::SeqCst)
    }

    pub fn health_count(&self) -> u32 {
        self.health_count.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> u32 {
        self.status_count.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockLightsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LightsService for MockLightsService {
    async fn ping(&self) -> Result<(), ServiceError> {
        self.ping_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ServiceError::Network("connection refused".to_string()))
        }
    }

    async fn health(&self) -> Result<HealthReport, ServiceError> {
        self.health_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        lock(&self.health).clone()
    }

    async fn status(&self) -> Result<StatusSnapshot, ServiceError> {
        self.status_count.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        lock(&self.status).clone()
    }

    async fn send(&self, command: &Command) -> Result<CommandReply, ServiceError> {
        lock(&self.commands).push(command.clone());
        self.simulate_latency().await;
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Ok(CommandReply::success()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ControlAction;

    #[tokio::test]
    async fn test_mock_defaults_healthy() {
        let service = MockLightsService::new();

        assert!(service.ping().await.is_ok());
        assert!(service.health().await.unwrap().gpio_available);
        assert!(service.status().await.unwrap().current_user.is_none());
        assert_eq!(service.ping_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_replies_in_order() {
        let service = MockLightsService::new();
        service.push_reply(Ok(CommandReply::failure("busy")));

        let cmd = Command::Control {
            user_id: "u1".into(),
            action: ControlAction::Acquire,
        };
        let first = service.send(&cmd).await.unwrap();
        let second = service.send(&cmd).await.unwrap();

        assert!(!first.is_success());
        assert!(second.is_success());
        assert_eq!(service.commands(), vec![cmd.clone(), cmd]);
    }
}
