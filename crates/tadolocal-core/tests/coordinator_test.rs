// Integration tests for the synchronization coordinator using wiremock.

#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tadolocal_core::{
    Command, Coordinator, CoreError, EntityId, Readiness, SyncConfig, ZoneSetting,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> SyncConfig {
    let mut config = SyncConfig::for_base_url(server.uri().parse().unwrap());
    // Background timers are driven explicitly in tests.
    config.poll_interval = Duration::ZERO;
    config.stream_enabled = false;
    config
}

async fn mount_listings(server: &MockServer, zones: Value, devices: Value) {
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zones))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices))
        .mount(server)
        .await;
}

fn standard_zone(id: &str, temp: f64) -> Value {
    json!({
        "zone_id": id,
        "name": format!("Zone {id}"),
        "zone_type": "STANDARD",
        "state": { "cur_temp_c": temp, "target_temp_c": 21.0, "hum_perc": 50.0 },
    })
}

// ── First refresh ───────────────────────────────────────────────────

#[tokio::test]
async fn connect_blocks_on_first_refresh_and_becomes_ready() {
    let server = MockServer::start().await;
    mount_listings(
        &server,
        json!([standard_zone("z1", 20.0)]),
        json!([{ "device_id": "d1", "serial_number": "VA001",
                 "device_type": "radiator_valve", "state": { "battery_low": false } }]),
    )
    .await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    assert_eq!(*coordinator.readiness().borrow(), Readiness::Uninitialized);

    coordinator.connect().await.expect("connect should succeed");

    assert_eq!(*coordinator.readiness().borrow(), Readiness::Ready);
    let state = coordinator.state();
    assert_eq!(state.zones.len(), 1);
    assert_eq!(state.devices.len(), 1);
    assert!(coordinator.last_full_refresh().is_some());

    coordinator.shutdown().await;
}

#[tokio::test]
async fn first_refresh_failure_aborts_connect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    let err = coordinator.connect().await.expect_err("502 should be fatal");

    assert!(matches!(
        err,
        CoreError::UpstreamStatus { status: 502, .. }
    ));
    assert_eq!(*coordinator.readiness().borrow(), Readiness::Uninitialized);
    assert!(coordinator.state().zones.is_empty());
    assert!(coordinator.last_full_refresh().is_none());
}

#[tokio::test]
async fn device_listing_failure_is_atomic() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([standard_zone("z1", 20.0)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator
        .connect()
        .await
        .expect_err("device failure should abort the cycle");

    // No partial state: the zone listing succeeded but nothing was kept.
    assert!(coordinator.state().zones.is_empty());
}

// ── Hot-water enrichment ────────────────────────────────────────────

#[tokio::test]
async fn enrichment_failure_is_isolated_per_zone() {
    let server = MockServer::start().await;
    mount_listings(
        &server,
        json!([
            { "zone_id": 1, "name": "Bathroom", "zone_type": "HOT_WATER", "state": {} },
            { "zone_id": 2, "name": "Kitchen Tap", "zone_type": "HOT_WATER", "state": {} },
            standard_zone("z3", 19.0),
        ]),
        json!([]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/hot_water/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": { "mode": "auto", "target_temp_c": 55.0, "supports_temperature": true }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hot_water/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator
        .connect()
        .await
        .expect("enrichment failure must not abort the refresh");

    let state = coordinator.state();
    assert_eq!(state.zones.len(), 3);

    let enriched = state.hot_water_state(&EntityId::Int(1)).unwrap();
    assert_eq!(enriched.target_temp_c, Some(55.0));

    // The failing zone is still present, just without enrichment.
    assert!(state.zone(&EntityId::Int(2)).is_some());
    assert!(state.hot_water_state(&EntityId::Int(2)).is_none());

    coordinator.shutdown().await;
}

// ── Steady-state refresh ────────────────────────────────────────────

#[tokio::test]
async fn poll_failure_preserves_previous_state() {
    let server = MockServer::start().await;
    mount_listings(&server, json!([standard_zone("z1", 20.0)]), json!([])).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator.connect().await.unwrap();
    let before = coordinator.state();

    // The bridge starts failing.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = coordinator.refresh().await.expect_err("cycle should fail");
    assert!(matches!(err, CoreError::UpstreamStatus { status: 503, .. }));

    // Previously published state is still retrievable, unchanged.
    assert_eq!(coordinator.state(), before);
    assert!(coordinator.refresh_errors().borrow().is_some());

    // Recovery clears the failure report.
    server.reset().await;
    mount_listings(&server, json!([standard_zone("z1", 20.5)]), json!([])).await;
    coordinator.refresh().await.unwrap();
    assert!(coordinator.refresh_errors().borrow().is_none());

    coordinator.shutdown().await;
}

#[tokio::test]
async fn poll_cycle_shares_one_total_time_budget() {
    let server = MockServer::start().await;

    // Each listing answers well inside the per-request ceiling, but the
    // two together blow the cycle budget.
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([standard_zone("z1", 20.0)]))
                .set_delay(Duration::from_millis(350)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(350)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.request_timeout = Duration::from_millis(500);

    let coordinator = Coordinator::new(config).unwrap();
    let err = coordinator
        .connect()
        .await
        .expect_err("cycle should exceed its total budget");

    assert!(matches!(err, CoreError::Timeout));
    assert!(coordinator.state().zones.is_empty());
}

#[tokio::test]
async fn concurrent_refresh_triggers_coalesce_to_one_flight() {
    let server = MockServer::start().await;
    mount_listings(&server, json!([standard_zone("z1", 20.0)]), json!([])).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator.connect().await.unwrap();

    // From here on, exactly one listing cycle may hit the bridge.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([standard_zone("z1", 21.0)]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(coordinator.refresh(), coordinator.refresh());
    first.expect("in-flight refresh should succeed");
    second.expect("second trigger is skipped, not failed");

    coordinator.shutdown().await;
    server.verify().await;
}

// ── Push events ─────────────────────────────────────────────────────

#[tokio::test]
async fn push_event_merges_into_shared_state() {
    let server = MockServer::start().await;
    mount_listings(&server, json!([standard_zone("z1", 20.0)]), json!([])).await;

    let frame = "data: {\"type\": \"zone\", \"zone_id\": \"z1\", \
                 \"state\": {\"cur_temp_c\": 21.0}}\n\n";
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(frame, "text/event-stream"))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.stream_enabled = true;
    config.stream_reconnect_delay = Duration::from_secs(30);

    let coordinator = Coordinator::new(config).unwrap();
    coordinator.connect().await.unwrap();
    let mut updates = coordinator.subscribe();

    let state = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let current = updates.latest();
            if current
                .zone_state(&EntityId::from("z1"))
                .is_some_and(|s| s.cur_temp_c == Some(21.0))
            {
                return current;
            }
            updates.changed().await.expect("coordinator is alive");
        }
    })
    .await
    .expect("event should be merged promptly");

    let zone_state = state.zone_state(&EntityId::from("z1")).unwrap();
    assert_eq!(zone_state.cur_temp_c, Some(21.0));
    // Full replacement: fields from the poll that the event omitted are gone.
    assert_eq!(zone_state.hum_perc, None);
    assert!(coordinator.last_push_event().is_some());

    coordinator.shutdown().await;
}

#[tokio::test]
async fn stream_reconnects_after_disconnect_and_keeps_delivering() {
    let server = MockServer::start().await;
    mount_listings(&server, json!([standard_zone("z1", 20.0)]), json!([])).await;

    // Each connection delivers one frame, then the body ends -- a
    // simulated disconnect every cycle. The first connection reports
    // 21°C, every later one 22°C, so the reconnect is observable in
    // the merged state.
    let first_frame = "data: {\"type\": \"zone\", \"zone_id\": \"z1\", \
                       \"state\": {\"cur_temp_c\": 21.0}}\n\n";
    let later_frame = "data: {\"type\": \"zone\", \"zone_id\": \"z1\", \
                       \"state\": {\"cur_temp_c\": 22.0}}\n\n";
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(first_frame, "text/event-stream"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(later_frame, "text/event-stream"))
        .mount(&server)
        .await;

    let delay = Duration::from_millis(200);
    let mut config = config_for(&server);
    config.stream_enabled = true;
    config.stream_reconnect_delay = delay;

    let coordinator = Coordinator::new(config).unwrap();
    let started = Instant::now();
    coordinator.connect().await.unwrap();

    let temp_seen = |wanted: f64| {
        let coordinator = coordinator.clone();
        async move {
            loop {
                let seen = coordinator
                    .state()
                    .zone_state(&EntityId::from("z1"))
                    .is_some_and(|s| s.cur_temp_c == Some(wanted));
                if seen {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    };

    tokio::time::timeout(Duration::from_secs(3), temp_seen(21.0))
        .await
        .expect("first connection should deliver");

    tokio::time::timeout(Duration::from_secs(3), temp_seen(22.0))
        .await
        .expect("stream should reconnect and keep delivering");

    // The second delivery required a reconnect, which waits the fixed
    // backoff first.
    assert!(started.elapsed() >= delay);

    coordinator.shutdown().await;
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn successful_command_triggers_out_of_band_refresh() {
    let server = MockServer::start().await;
    mount_listings(&server, json!([standard_zone("z1", 20.0)]), json!([])).await;

    Mock::given(method("POST"))
        .and(path("/zones/z1/set"))
        .and(query_param("temperature", "22.5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator.connect().await.unwrap();
    let first_refresh = coordinator.last_full_refresh().unwrap();

    coordinator
        .execute(Command::SetZone {
            id: EntityId::from("z1"),
            setting: ZoneSetting::Heat(22.5),
        })
        .await
        .expect("write should succeed");

    // The post-command refresh replaced the snapshot again.
    assert!(coordinator.last_full_refresh().unwrap() > first_refresh);

    coordinator.shutdown().await;
    server.verify().await;
}

#[tokio::test]
async fn failed_command_surfaces_without_corrupting_state() {
    let server = MockServer::start().await;
    mount_listings(&server, json!([standard_zone("z1", 20.0)]), json!([])).await;

    Mock::given(method("POST"))
        .and(path("/zones/z1/set"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator.connect().await.unwrap();
    let before = coordinator.state();

    let err = coordinator
        .execute(Command::SetZone {
            id: EntityId::from("z1"),
            setting: ZoneSetting::Off,
        })
        .await
        .expect_err("500 should surface to the caller");

    assert!(matches!(err, CoreError::UpstreamStatus { status: 500, .. }));
    assert_eq!(coordinator.state(), before);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn commands_require_a_connected_coordinator() {
    let server = MockServer::start().await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    let err = coordinator
        .execute(Command::SetZone {
            id: EntityId::Int(1),
            setting: ZoneSetting::Auto,
        })
        .await
        .expect_err("commands before connect must fail");

    assert!(matches!(err, CoreError::NotConnected));
}

#[tokio::test]
async fn hot_water_command_omits_temperature_when_unsupported() {
    let server = MockServer::start().await;
    mount_listings(
        &server,
        json!([{ "zone_id": 2, "name": "Bathroom", "zone_type": "HOT_WATER", "state": {} }]),
        json!([]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/hot_water/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": { "mode": "auto", "supports_temperature": false }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/hot_water/2/set"))
        .and(query_param("mode", "heat"))
        .and(query_param_is_missing("temperature"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator.connect().await.unwrap();

    coordinator
        .execute(Command::SetHotWater {
            id: EntityId::Int(2),
            mode: Some(tadolocal_core::HotWaterMode::Heat),
            temperature: Some(60.0),
        })
        .await
        .expect("write should succeed");

    coordinator.shutdown().await;
    server.verify().await;
}
