//! End-to-end client scenarios against the in-memory light service

use std::sync::Arc;
use std::time::Duration;

use lights_client::service::{Command, CommandReply, ControlAction, StatusSnapshot};
use lights_client::{
    ClientError, ClientIdentity, Config, ConnectivityState, ControlState, IntentOutcome,
    LightsClient, MockLightsService, ServiceError,
};

fn client(service: &Arc<MockLightsService>, user: &str) -> LightsClient {
    LightsClient::new(&Config::default(), service.clone(), ClientIdentity::from(user))
}

fn snapshot(owner: Option<&str>, queue: &[&str], lights: &[(u32, bool)]) -> StatusSnapshot {
    StatusSnapshot {
        lights: lights.iter().copied().collect(),
        current_user: owner.map(String::from),
        queue: queue.iter().map(|s| s.to_string()).collect(),
        time_remaining: Some(40.0),
    }
}

#[tokio::test]
async fn test_owner_toggles_and_poll_confirms() {
    let service = Arc::new(MockLightsService::new().with_status(snapshot(None, &[], &[(3, false)])));
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();

    assert_eq!(client.request_control().await.unwrap(), IntentOutcome::Acquired);
    assert_eq!(
        client.toggle_light(3).await.unwrap(),
        IntentOutcome::LightToggled { light: 3 }
    );
    assert!(client.view().lights[&3]);

    service.set_status(snapshot(Some("u1"), &[], &[(3, true)]));
    client.poll_once().await.unwrap();

    let view = client.view();
    assert_eq!(
        view.control,
        ControlState::Owned {
            time_remaining: Some(40.0)
        }
    );
    assert_eq!(view.status_line, "You have control (40s remaining)");
    assert!(view.lights[&3]);
    assert!(view.affordances.lights.enabled);
    assert_eq!(
        service.commands(),
        vec![
            Command::Control {
                user_id: "u1".into(),
                action: ControlAction::Acquire
            },
            Command::ToggleLight {
                user_id: "u1".into(),
                light: 3
            },
        ]
    );
}

#[tokio::test]
async fn test_refused_client_waits_in_queue() {
    let service = Arc::new(MockLightsService::new().with_status(snapshot(Some("u1"), &[], &[])));
    let client = client(&service, "u2");
    client.poll_once().await.unwrap();
    assert_eq!(client.view().status_line, "Someone else has control");

    service.push_reply(Ok(CommandReply::failure("Added to queue")));
    assert_eq!(
        client.request_control().await.unwrap(),
        IntentOutcome::Queued {
            message: "Added to queue".into()
        }
    );
    assert_eq!(client.view().control, ControlState::Queued { position: None });

    service.set_status(snapshot(Some("u1"), &["u2"], &[]));
    client.poll_once().await.unwrap();

    let view = client.view();
    assert_eq!(view.control, ControlState::Queued { position: Some(1) });
    assert_eq!(view.status_line, "In queue (position 1)");
    assert!(view.affordances.leave_queue.enabled);
    assert!(!view.affordances.lights.enabled);

    // Toggles are ignored without control
    assert_eq!(client.toggle_light(1).await.unwrap(), IntentOutcome::Ignored);
    assert_eq!(client.leave_queue().await.unwrap(), IntentOutcome::LeftQueue);
    assert_eq!(client.view().control, ControlState::Uncontrolled);
}

#[tokio::test]
async fn test_gpio_loss_disables_everything_until_recovery() {
    let service = Arc::new(MockLightsService::new());
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();
    client.request_control().await.unwrap();
    assert!(client.view().control.is_owned());

    service.set_gpio_available(false);
    assert_eq!(
        client.poll_once().await.unwrap_err(),
        ClientError::Connectivity("GPIO not available".into())
    );

    let view = client.view();
    assert_eq!(view.status_line, "Server Offline");
    assert_eq!(view.error_banner.as_deref(), Some("Server Error: GPIO not available"));
    assert_eq!(view.control, ControlState::Uncontrolled);
    assert!(!view.affordances.any_enabled());

    let sent = service.command_count();
    assert_eq!(client.request_control().await.unwrap_err(), ClientError::Offline);
    assert_eq!(service.command_count(), sent);

    service.set_gpio_available(true);
    client.poll_once().await.unwrap();

    let view = client.view();
    assert_eq!(view.connectivity, ConnectivityState::Connected);
    assert!(view.error_banner.is_none());
    assert_eq!(view.status_line, "Control available");
}

#[tokio::test]
async fn test_root_failure_drops_ownership() {
    let service = Arc::new(MockLightsService::new());
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();
    client.request_control().await.unwrap();
    assert!(client.view().control.is_owned());

    service.set_alive(false);
    assert_eq!(
        client.poll_once().await.unwrap_err(),
        ClientError::Connectivity("Server not responding".into())
    );

    let view = client.view();
    assert_eq!(view.control, ControlState::Uncontrolled);
    assert_eq!(view.error_banner.as_deref(), Some("Server Error: Server not responding"));
    assert!(!view.affordances.any_enabled());
}

#[tokio::test]
async fn test_status_failure_drops_queue_membership() {
    let service = Arc::new(MockLightsService::new().with_status(snapshot(Some("u1"), &["u2"], &[])));
    let client = client(&service, "u2");
    client.poll_once().await.unwrap();
    assert_eq!(client.view().control, ControlState::Queued { position: Some(1) });

    service.set_status_error(ServiceError::Status {
        status: 500,
        message: None,
    });
    assert_eq!(
        client.poll_once().await.unwrap_err(),
        ClientError::Connectivity("Status check failed".into())
    );

    let view = client.view();
    assert_eq!(view.control, ControlState::Uncontrolled);
    assert_eq!(view.status_line, "Server Offline");
    assert!(!view.affordances.leave_queue.visible);
}

#[tokio::test]
async fn test_status_failure_drops_ownership() {
    let service = Arc::new(MockLightsService::new());
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();
    client.request_control().await.unwrap();

    service.set_status_error(ServiceError::Network("connection reset".into()));
    assert!(client.poll_once().await.is_err());

    assert_eq!(client.view().control, ControlState::Uncontrolled);
    assert_eq!(client.toggle_light(1).await.unwrap(), IntentOutcome::Ignored);
}

#[tokio::test]
async fn test_null_time_remaining_keeps_client_online() {
    let mut snap = snapshot(Some("u1"), &[], &[(1, true)]);
    snap.time_remaining = None;
    let service = Arc::new(MockLightsService::new().with_status(snap));
    let client = client(&service, "u1");

    assert!(client.poll_once().await.unwrap());

    let view = client.view();
    assert_eq!(view.connectivity, ConnectivityState::Connected);
    assert_eq!(view.status_line, "You have control");
}

#[tokio::test]
async fn test_server_revocation_wins_over_local_belief() {
    let service = Arc::new(MockLightsService::new());
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();
    client.request_control().await.unwrap();

    service.set_status(snapshot(Some("u2"), &[], &[(1, true)]));
    client.poll_once().await.unwrap();

    let view = client.view();
    assert_eq!(view.control, ControlState::Uncontrolled);
    assert_eq!(view.status_line, "Someone else has control");
    assert_eq!(client.toggle_light(1).await.unwrap(), IntentOutcome::Ignored);
}

#[tokio::test]
async fn test_inapplicable_intents_send_nothing() {
    let service = Arc::new(MockLightsService::new());
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();

    assert_eq!(client.release_control().await.unwrap(), IntentOutcome::Ignored);
    assert_eq!(client.leave_queue().await.unwrap(), IntentOutcome::Ignored);
    assert_eq!(client.play_song("song1").await.unwrap(), IntentOutcome::Ignored);
    assert_eq!(service.command_count(), 0);
}

#[tokio::test]
async fn test_song_message_is_returned() {
    let service = Arc::new(MockLightsService::new());
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();
    client.request_control().await.unwrap();

    service.push_reply(Ok(CommandReply::message_only("Playing song2")));
    assert_eq!(
        client.play_song("song2").await.unwrap(),
        IntentOutcome::Message("Playing song2".into())
    );

    service.push_reply(Ok(CommandReply::message_only("Song not found")));
    assert_eq!(
        client.play_song("nope").await.unwrap(),
        IntentOutcome::Message("Song not found".into())
    );
}

#[tokio::test]
async fn test_rejected_release_keeps_control() {
    let service = Arc::new(MockLightsService::new());
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();
    client.request_control().await.unwrap();

    service.push_reply(Ok(CommandReply::failure("You do not have control")));
    let err = client.release_control().await.unwrap_err();

    assert_eq!(err.user_message(), "You do not have control");
    assert!(client.view().control.is_owned());
}

#[tokio::test(start_paused = true)]
async fn test_poller_runs_immediately_then_on_interval() {
    let service = Arc::new(MockLightsService::new().with_status(snapshot(None, &[], &[(1, true)])));
    let client = client(&service, "u1");

    let poller = client.start_polling();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(service.status_count(), 1);
    assert!(poller.is_running());
    assert!(client.view().lights[&1]);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.status_count(), 2);

    poller.stop().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(service.status_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_command_forces_offline() {
    let service = Arc::new(MockLightsService::new());
    let client = client(&service, "u1");
    client.poll_once().await.unwrap();
    client.request_control().await.unwrap();

    service.set_delay(Some(Duration::from_secs(30)));
    assert_eq!(client.toggle_light(2).await.unwrap_err(), ClientError::Timeout);

    let view = client.view();
    assert_eq!(view.error_banner.as_deref(), Some("Server Error: Server request timed out"));
    assert!(!view.lights[&2]);
    assert!(!view.affordances.any_enabled());
}
