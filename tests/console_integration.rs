//! Integration tests for the console wiring.
//!
//! These tests drive a fully attached `Console` over `MockPinicApi` and
//! check that controllers cooperate only through the bus:
//! 1. Tree refreshes replace children instead of accumulating them
//! 2. Handlers observe the event they were called with as the latest one
//! 3. Pushed warnings reach the detail panel, the log and the status bar
//! 4. Config saves trigger a tree refresh

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use pinic_console::adapters::{Endpoint, InMemoryEventBus, MockPinicApi};
use pinic_console::application::Console;
use pinic_console::config::ConsoleConfig;
use pinic_console::domain::chart::ChartState;
use pinic_console::domain::device::{KnownDevice, NodeConfig, SensorEntry};
use pinic_console::domain::events::{ConsoleEvent, EventKind};
use pinic_console::domain::foundation::{DomainError, NodeId, SensorId, SensorPath, ServerId};
use pinic_console::domain::tab::Tab;
use pinic_console::domain::warning::{WarningNode, WarningPayload};
use pinic_console::ports::{EventHandler, EventPublisher, EventSubscriber, RealtimeEvent};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn node_config(node: &str, sensors: &[(&str, &str)]) -> NodeConfig {
    NodeConfig {
        node_id: NodeId::new(node),
        sensors: sensors
            .iter()
            .map(|(id, sensor_type)| SensorEntry {
                sensor_type: sensor_type.to_string(),
                sensor_id: SensorId::new(*id),
                ..SensorEntry::default()
            })
            .collect(),
        ..NodeConfig::default()
    }
}

/// One forwarder, two servers, three nodes.
fn backend() -> MockPinicApi {
    let s1 = ServerId::new("S-1");
    let s2 = ServerId::new("S-2");
    MockPinicApi::new()
        .with_server(KnownDevice::new("S-1").with_desc("lab/floor-1"))
        .with_server(KnownDevice::new("S-2").with_desc("lab/floor-2"))
        .with_node(
            &s1,
            KnownDevice::new("N-1"),
            node_config("N-1", &[("X-1", "tlc1549"), ("X-2", "stub")]),
        )
        .with_node(&s1, KnownDevice::new("N-2"), node_config("N-2", &[("X-3", "random")]))
        .with_node(&s2, KnownDevice::new("N-3"), node_config("N-3", &[]))
}

fn console(api: &MockPinicApi, bus: Arc<InMemoryEventBus>) -> Console {
    let config = ConsoleConfig {
        tree_refresh_secs: 3600,
        ..ConsoleConfig::default()
    };
    let console = Console::new(Arc::new(api.clone()), bus, &config).unwrap();
    console.attach();
    console
}

fn warning(sensor: &str, raw_value: f64) -> WarningPayload {
    WarningPayload {
        timestamp: 1_700_000_000.0,
        sensor_id: SensorId::new(sensor),
        raw_value,
        sensor_type: "tlc1549".to_string(),
        server: ServerId::new("S-1"),
        node: WarningNode {
            id: NodeId::new("N-1"),
        },
    }
}

/// Records whether `last_event` matched the delivered event on every call.
struct LastEventProbe {
    bus: Arc<InMemoryEventBus>,
    calls: AtomicUsize,
    mismatches: Mutex<Vec<String>>,
}

#[async_trait]
impl EventHandler for LastEventProbe {
    async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let seen = self.bus.last_event(event.kind());
        if seen.as_ref() != Some(&event) {
            self.mismatches
                .lock()
                .unwrap()
                .push(format!("got {:?}, last_event {:?}", event, seen));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LastEventProbe"
    }
}

// =============================================================================
// Device tree
// =============================================================================

#[tokio::test]
async fn refresh_replaces_children_with_latest_listing() {
    let api = backend();
    let console = console(&api, Arc::new(InMemoryEventBus::new()));

    console.tree().refresh().await;
    console.tree().refresh().await;

    let tree = console.tree().tree();
    let tree = tree.read().await;
    assert_eq!(tree.forwarder.servers.len(), 2);
    let s1 = tree.forwarder.server(&ServerId::new("S-1")).unwrap();
    assert_eq!(s1.nodes.len(), 2);
    assert_eq!(s1.sensor_count(), 3);
    drop(tree);

    api.remove_server(&ServerId::new("S-2"));
    console.tree().refresh().await;

    let tree = console.tree().tree();
    let tree = tree.read().await;
    assert_eq!(tree.forwarder.servers.len(), 1);
    assert!(tree.forwarder.server(&ServerId::new("S-2")).is_none());
}

#[tokio::test]
async fn save_triggers_tree_refresh() {
    let api = backend();
    let bus = Arc::new(InMemoryEventBus::recording());
    let console = console(&api, bus.clone());

    console.tree().show_forwarder_config().await.unwrap();
    assert_eq!(console.tabs().current().await, Tab::ForwarderConfig);
    assert!(console.forwarder_config().current().await.is_some());

    let before = api.call_count(&Endpoint::KnownServers);
    console
        .forwarder_config()
        .update_draft(|draft| draft.forwarder_desc = "rooftop".to_string())
        .await;
    let outcome = console.forwarder_config().send().await.unwrap();

    assert!(outcome.is_success());
    assert!(bus.has_event(EventKind::RefreshTree));
    assert_eq!(api.call_count(&Endpoint::KnownServers), before + 1);
    let tree = console.tree().tree();
    assert_eq!(tree.read().await.forwarder.config.forwarder_desc, "rooftop");
}

#[tokio::test]
async fn node_config_shortcut_loads_editor() {
    let api = backend();
    let console = console(&api, Arc::new(InMemoryEventBus::new()));

    console
        .device_list()
        .show_node_config(ServerId::new("S-1"), NodeId::new("N-2"))
        .await
        .unwrap();

    assert_eq!(console.tabs().current().await, Tab::NodeConfig);
    let draft = console.node_config().draft().await.unwrap();
    assert_eq!(draft.node_id.as_str(), "N-2");
    assert!(console.server_config().current().await.is_none());
}

// =============================================================================
// Bus semantics
// =============================================================================

#[tokio::test]
async fn handlers_see_their_own_event_as_latest() {
    let bus = Arc::new(InMemoryEventBus::new());
    let probe = Arc::new(LastEventProbe {
        bus: bus.clone(),
        calls: AtomicUsize::new(0),
        mismatches: Mutex::new(Vec::new()),
    });
    bus.subscribe_all(&EventKind::ALL, probe.clone());
    let console = console(&backend(), bus.clone());
    console.tree().refresh().await;

    console.tree().show_server(ServerId::new("S-1")).await.unwrap();
    console
        .device_list()
        .open_sensor_chart(SensorPath::new("S-1", "N-1", "X-1"))
        .await
        .unwrap();
    for (sensor, raw) in [("X-1", 3.0), ("X-2", 4.0)] {
        console
            .handle_realtime(RealtimeEvent::Warning(warning(sensor, raw)))
            .await
            .unwrap();
    }
    console.status().cancel_warning().await.unwrap();

    assert!(probe.calls.load(Ordering::SeqCst) >= 7);
    assert!(probe.mismatches.lock().unwrap().is_empty());
}

proptest! {
    #[test]
    fn last_event_matches_most_recent_publish(raws in proptest::collection::vec(0.0f64..1024.0, 1..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let bus = Arc::new(InMemoryEventBus::new());
            let probe = Arc::new(LastEventProbe {
                bus: bus.clone(),
                calls: AtomicUsize::new(0),
                mismatches: Mutex::new(Vec::new()),
            });
            bus.subscribe(EventKind::ShowWarning, probe.clone());

            for raw in &raws {
                bus.publish(ConsoleEvent::ShowWarning {
                    sensor: SensorPath::new("S-1", "N-1", "X-1"),
                    raw_value: *raw,
                })
                .await
                .unwrap();
            }

            assert_eq!(probe.calls.load(Ordering::SeqCst), raws.len());
            assert!(probe.mismatches.lock().unwrap().is_empty());
            let last = bus.last_event(EventKind::ShowWarning);
            assert_eq!(
                last,
                Some(ConsoleEvent::ShowWarning {
                    sensor: SensorPath::new("S-1", "N-1", "X-1"),
                    raw_value: *raws.last().unwrap(),
                })
            );
        });
    }
}

// =============================================================================
// Realtime flow
// =============================================================================

#[tokio::test]
async fn pushed_warning_reaches_every_region() {
    let api = backend();
    let console = console(&api, Arc::new(InMemoryEventBus::new()));
    console.tree().refresh().await;
    console.tree().show_server(ServerId::new("S-1")).await.unwrap();
    console.status().set_sound_alert(true).await;

    console
        .handle_realtime(RealtimeEvent::Warning(warning("X-1", 512.0)))
        .await
        .unwrap();

    let shown = console.device_list().shown().await.unwrap();
    assert!(shown.warning);
    let sensor = shown
        .node(&NodeId::new("N-1"))
        .and_then(|n| n.sensor(&SensorId::new("X-1")))
        .unwrap();
    assert!(sensor.warning);
    assert_eq!(sensor.value, "250.00Ω");

    let items = console.warnings().items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].device, "S-1/N-1");
    assert_eq!(items[0].value, "250.00Ω");

    let status = console.status().view().await;
    assert!(status.warning);
    assert_eq!(status.alerts_sounded, 1);

    console.status().cancel_warning().await.unwrap();
    assert!(!console.status().view().await.warning);
}

#[tokio::test]
async fn connection_events_drive_status_lights() {
    let console = console(&backend(), Arc::new(InMemoryEventBus::new()));
    assert!(console.status().view().await.forwarder_online);

    console.handle_realtime(RealtimeEvent::Disconnected).await.unwrap();
    assert!(!console.status().view().await.forwarder_online);

    console.handle_realtime(RealtimeEvent::Connected).await.unwrap();
    assert!(console.status().view().await.forwarder_online);

    console.tree().refresh().await;
    assert!(console.status().view().await.server_online);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn sensor_chart_opens_on_chart_tab() {
    let console = console(&backend(), Arc::new(InMemoryEventBus::new()));

    console
        .device_list()
        .open_sensor_chart(SensorPath::new("S-1", "N-1", "X-1"))
        .await
        .unwrap();

    assert_eq!(console.tabs().current().await, Tab::Chart);
    assert_eq!(console.chart().state(), ChartState::Running);
    assert_eq!(console.chart().interval(), Duration::from_millis(500));
    console.chart().clear();
}

#[tokio::test]
async fn detached_console_ignores_events() {
    let bus = Arc::new(InMemoryEventBus::new());
    let console = console(&backend(), bus.clone());
    assert!(console.is_attached());

    console.detach();
    bus.publish(ConsoleEvent::JumpPage { tab: Tab::Chart })
        .await
        .unwrap();

    assert!(!console.is_attached());
    assert_eq!(console.tabs().current().await, Tab::Devices);
    assert_eq!(bus.handler_count(EventKind::JumpPage), 0);
}

#[tokio::test]
async fn run_refreshes_then_detaches_on_shutdown() {
    let api = backend();
    let bus = Arc::new(InMemoryEventBus::new());
    let console = Arc::new(
        Console::new(Arc::new(api.clone()), bus.clone(), &ConsoleConfig::default()).unwrap(),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let runner = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.run(None, shutdown_rx).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(console.is_attached());
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), runner)
        .await
        .unwrap()
        .unwrap();

    assert!(!console.is_attached());
    assert_eq!(api.call_count(&Endpoint::KnownServers), 1);
    assert!(bus.last_event(EventKind::ServerConnect).is_some());
}
