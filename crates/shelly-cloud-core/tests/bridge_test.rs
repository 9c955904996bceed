#![allow(clippy::unwrap_used)]
// Integration tests for `Bridge` against a wiremock Shelly Cloud.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelly_cloud_core::{
    Bridge, BridgeConfig, BridgeState, CoreError, Entity, EntityKey, SensorKind, Turn,
    WritePolicy, build_entity,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer, write_policy: WritePolicy) -> BridgeConfig {
    let mut config = BridgeConfig::new(
        "me@example.com",
        SecretString::from("pw".to_string()),
        Url::parse(&server.uri()).unwrap(),
    );
    // Tests drive every poll by hand.
    config.status_interval = Duration::ZERO;
    config.discovery_interval = Duration::ZERO;
    config.write_policy = write_policy;
    config
}

async fn mount_login(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": true,
            "data": { "token": "T", "user_api_url": server.uri() }
        })))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_device_list(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/interface/device/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": true,
            "data": {
                "devices": {
                    "abc": { "id": "abc", "name": "Plug", "channels_count": 1, "type": "SHPLG-S" },
                    "two": { "name": "Relay", "channels_count": 2, "type": "SHSW-25" }
                }
            }
        })))
        .mount(server)
        .await;
}

fn all_status_body() -> serde_json::Value {
    json!({
        "isok": true,
        "data": {
            "devices_status": {
                "abc": {
                    "cloud": { "connected": true, "enabled": true },
                    "relays": [{ "ison": true }],
                    "power": { "value": 1500 }
                },
                "two": {
                    "cloud": { "connected": false, "enabled": true },
                    "relays": [{ "ison": false }, { "ison": true }]
                },
                "ghost": {
                    "cloud": { "connected": true, "enabled": true },
                    "relays": [{ "ison": true }]
                }
            }
        }
    })
}

async fn mount_all_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/device/all_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(all_status_body()))
        .mount(server)
        .await;
}

async fn connected_bridge(server: &MockServer, write_policy: WritePolicy) -> Bridge {
    mount_login(server, 1).await;
    mount_device_list(server).await;
    mount_all_status(server).await;

    let bridge = Bridge::new(config_for(server, write_policy)).unwrap();
    bridge.connect().await.unwrap();
    bridge
}

async fn mount_relay_rejection(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/device/relay/control"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": false,
            "errors": { "bad_channel": "out of range" }
        })))
        .mount(server)
        .await;
}

async fn mount_rejected_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": false,
            "errors": { "wrong_credentials": "Invalid email or password" }
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

fn timed_config(server: &MockServer, every: Duration) -> BridgeConfig {
    let mut config = config_for(server, WritePolicy::Always);
    config.status_interval = every;
    config.discovery_interval = every;
    config
}

async fn status_polls(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/device/all_status")
        .count()
}

/// Log lines written by the bridge on the current thread.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let logs = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || logs.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

// ── Startup ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_login_leaves_bridge_degraded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isok": false,
            "errors": { "wrong_credentials": "Invalid email or password" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bridge = Bridge::start(config_for(&server, WritePolicy::Always))
        .await
        .unwrap();

    assert_eq!(bridge.state(), BridgeState::Unauthenticated);
    assert!(bridge.devices_snapshot().is_empty());
    assert!(bridge.statuses_snapshot().is_empty());
    assert!(bridge.last_status_refresh().is_none());
    assert!(matches!(
        bridge.refresh_status().await,
        Err(CoreError::Unauthenticated)
    ));
    assert!(!bridge.set_channel("abc", 0, Turn::On).await);
}

#[tokio::test]
async fn test_connect_populates_snapshots() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::Always).await;

    assert_eq!(bridge.state(), BridgeState::Authenticated);
    assert_eq!(bridge.devices_snapshot().len(), 2);
    // "ghost" is not in the device list.
    assert_eq!(bridge.statuses_snapshot().len(), 2);
    assert!(bridge.device_status("ghost").is_none());

    assert_eq!(bridge.device("two").unwrap().name, "Relay");
    assert!(bridge.switch_status("abc", 0));
    assert!(!bridge.switch_status("two", 0));
    assert!(bridge.switch_status("two", 1));
    assert!(!bridge.switch_status("two", 7));
    assert!(bridge.availability("abc"));
    assert!(!bridge.availability("two"));
    assert!(!bridge.availability("nope"));
    assert_eq!(bridge.sensor_value("abc", SensorKind::Power), Some(1500.0));
    assert_eq!(bridge.sensor_value("abc", SensorKind::Voltage), None);
    assert!(bridge.last_device_refresh().is_some());
    assert!(bridge.last_status_refresh().is_some());
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_discovery_announces_each_entity_once() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_device_list(&server).await;
    mount_all_status(&server).await;

    let bridge = Bridge::new(config_for(&server, WritePolicy::Always)).unwrap();
    let mut discoveries = bridge.subscribe_discoveries();
    bridge.connect().await.unwrap();

    let mut keys = Vec::new();
    while let Ok(entity) = discoveries.try_recv() {
        keys.push(entity.key);
    }
    keys.sort();
    assert_eq!(
        keys,
        vec![
            EntityKey::channel("abc", 0),
            EntityKey::sensor("abc", SensorKind::Power),
            EntityKey::channel("two", 0),
            EntityKey::channel("two", 1),
        ]
    );

    // Nothing changed on the account: nothing new to announce.
    assert!(bridge.refresh_devices().await.unwrap().is_empty());
    assert_eq!(bridge.refresh_status().await.unwrap(), 2);
    assert!(discoveries.try_recv().is_err());
}

#[tokio::test]
async fn test_built_entities_read_the_snapshot() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::Always).await;

    let power = build_entity(
        &bridge,
        &shelly_cloud_core::DiscoveredEntity {
            key: EntityKey::sensor("abc", SensorKind::Power),
            device_name: "Plug".into(),
            relay_count: 1,
        },
    )
    .unwrap();
    assert_eq!(power.entity_id(), "sensor.shelly_cloud_abc_power");
    assert_eq!(power.display_state(), "1.50");
    assert!(power.is_available());

    let second = build_entity(
        &bridge,
        &shelly_cloud_core::DiscoveredEntity {
            key: EntityKey::channel("two", 1),
            device_name: "Relay".into(),
            relay_count: 2,
        },
    )
    .unwrap();
    assert_eq!(second.entity_id(), "switch.shelly_cloud_two_1");
    assert_eq!(second.display_state(), "on");
    assert!(!second.is_available());

    let unknown = build_entity(
        &bridge,
        &shelly_cloud_core::DiscoveredEntity {
            key: EntityKey::channel("nope", 0),
            device_name: "Nope".into(),
            relay_count: 1,
        },
    );
    assert!(unknown.is_none());
}

// ── Relay commands ──────────────────────────────────────────────────

#[tokio::test]
async fn test_set_channel_success_patches_cache() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::OnSuccess).await;

    Mock::given(method("POST"))
        .and(path("/device/relay/control"))
        .and(body_string_contains("id=two"))
        .and(body_string_contains("channel=0"))
        .and(body_string_contains("turn=on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isok": true })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(bridge.set_channel("two", 0, Turn::On).await);
    assert!(bridge.switch_status("two", 0));
}

#[tokio::test]
async fn test_rejected_command_with_on_success_policy_keeps_cache() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::OnSuccess).await;
    mount_relay_rejection(&server).await;

    assert!(!bridge.set_channel("abc", 0, Turn::Off).await);
    assert!(bridge.switch_status("abc", 0));
}

#[tokio::test]
async fn test_rejected_command_with_always_policy_patches_cache() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::Always).await;
    mount_relay_rejection(&server).await;

    assert!(!bridge.set_channel("abc", 0, Turn::Off).await);
    assert!(!bridge.switch_status("abc", 0));

    // Unknown devices have nothing to patch.
    assert!(!bridge.set_channel("nope", 0, Turn::On).await);
    assert!(bridge.device_status("nope").is_none());
}

#[tokio::test]
async fn test_switch_entity_turn_on_reports_result() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::Always).await;

    Mock::given(method("POST"))
        .and(path("/device/relay/control"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isok": true })))
        .mount(&server)
        .await;

    let mut switch = shelly_cloud_core::SwitchEntity::new("two", "Relay", 0, 2);
    switch.update(&bridge);
    assert!(!switch.is_on());

    assert!(switch.turn_on(&bridge).await);
    assert!(switch.is_on());
    assert_eq!(switch.display_state(), "on");
}

// ── Session expiry ──────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_session_needs_reauthentication() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    mount_device_list(&server).await;

    Mock::given(method("GET"))
        .and(path("/device/all_status"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_all_status(&server).await;

    let bridge = Bridge::new(config_for(&server, WritePolicy::Always)).unwrap();
    let mut state = bridge.connection_state();
    bridge.connect().await.unwrap();

    // The initial status poll hit the 401.
    assert_eq!(bridge.state(), BridgeState::SessionExpired);
    assert_eq!(*state.borrow_and_update(), BridgeState::SessionExpired);
    assert!(matches!(
        bridge.refresh_status().await,
        Err(CoreError::SessionExpired)
    ));
    assert!(matches!(
        bridge.refresh_devices().await,
        Err(CoreError::SessionExpired)
    ));

    bridge.reauthenticate().await.unwrap();
    assert_eq!(bridge.state(), BridgeState::Authenticated);
    assert_eq!(bridge.refresh_status().await.unwrap(), 2);
}

#[tokio::test]
async fn test_disconnect_drops_session() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::Always).await;

    bridge.disconnect().await;

    assert_eq!(bridge.state(), BridgeState::Unauthenticated);
    assert!(matches!(
        bridge.refresh_status().await,
        Err(CoreError::Unauthenticated)
    ));
    // Snapshots outlive the session.
    assert_eq!(bridge.devices_snapshot().len(), 2);
}

#[tokio::test]
async fn test_set_channel_without_session_leaves_cache() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::Always).await;
    bridge.disconnect().await;

    assert!(!bridge.set_channel("two", 0, Turn::On).await);
    assert!(!bridge.switch_status("two", 0));
}

// ── Logging ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_command_logs_cloud_errors() {
    let server = MockServer::start().await;
    let bridge = connected_bridge(&server, WritePolicy::OnSuccess).await;
    mount_relay_rejection(&server).await;

    let logs = CapturedLogs::default();
    let _guard = logs.install();

    assert!(!bridge.set_channel("abc", 0, Turn::Off).await);

    let out = logs.contents();
    assert!(out.contains("ERROR"), "{out}");
    assert!(out.contains("bad_channel : out of range"), "{out}");
}

#[tokio::test]
async fn test_slow_status_poll_is_reported() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/device/all_status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(all_status_body())
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    // Logged in by hand so no periodic task is running.
    let bridge = Bridge::new(timed_config(&server, Duration::from_millis(20))).unwrap();
    bridge.login().await.unwrap();

    let logs = CapturedLogs::default();
    let _guard = logs.install();
    bridge.refresh_status().await.unwrap();

    let out = logs.contents();
    assert!(out.contains("refresh took longer than its polling interval"), "{out}");
}

// ── Periodic polling ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timers_poll_until_disconnect() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_device_list(&server).await;
    mount_all_status(&server).await;

    // Nobody watches the connection state.
    let bridge = Bridge::new(timed_config(&server, Duration::from_millis(50))).unwrap();
    bridge.connect().await.unwrap();
    assert_eq!(bridge.state(), BridgeState::Authenticated);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let polled = status_polls(&server).await;
    assert!(polled > 2, "only {polled} status polls");
    assert!(bridge.last_status_refresh().is_some());
    assert_eq!(bridge.statuses_snapshot().len(), 2);

    bridge.disconnect().await;
    let at_disconnect = status_polls(&server).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(status_polls(&server).await, at_disconnect);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reauthenticate_after_failed_start_begins_polling() {
    let server = MockServer::start().await;
    mount_rejected_login(&server).await;
    mount_login(&server, 1).await;
    mount_device_list(&server).await;
    mount_all_status(&server).await;

    let bridge = Bridge::start(timed_config(&server, Duration::from_millis(50)))
        .await
        .unwrap();
    assert_eq!(bridge.state(), BridgeState::Unauthenticated);
    assert_eq!(status_polls(&server).await, 0);

    bridge.reauthenticate().await.unwrap();
    assert_eq!(bridge.state(), BridgeState::Authenticated);
    assert_eq!(bridge.devices_snapshot().len(), 2);
    assert_eq!(bridge.statuses_snapshot().len(), 2);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let polled = status_polls(&server).await;
    assert!(polled > 1, "only {polled} status polls");

    bridge.disconnect().await;
}

#[tokio::test]
async fn test_disconnected_bridge_stays_idle_after_login() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    mount_device_list(&server).await;
    mount_all_status(&server).await;

    let bridge = Bridge::new(timed_config(&server, Duration::from_millis(20))).unwrap();
    bridge.connect().await.unwrap();
    bridge.disconnect().await;
    let at_disconnect = status_polls(&server).await;

    bridge.reauthenticate().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(bridge.state(), BridgeState::Authenticated);
    assert_eq!(status_polls(&server).await, at_disconnect);
}
