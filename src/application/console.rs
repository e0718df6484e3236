//! Console - wires every controller to one bus and drives the timers.

use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{error, info, warn};

use super::controllers::{
    ChartController, DeviceListController, DeviceTreeController, ForwarderConfigEditor,
    NodeConfigEditor, ServerConfigEditor, StatusController, TabController, WarningController,
};
use super::tree_service::DeviceTreeService;
use crate::config::ConsoleConfig;
use crate::domain::conversion::ValueConverter;
use crate::domain::device::DeviceTree;
use crate::domain::events::{ConsoleEvent, EventKind};
use crate::domain::foundation::DomainError;
use crate::ports::{
    EventBus, EventHandler, EventPublisher, PinicApi, RealtimeChannel, RealtimeEvent,
    SubscriptionId,
};

const REALTIME_BUFFER: usize = 64;

/// All controllers of one console, sharing one bus and one device tree.
///
/// Controllers receive nothing until `attach` subscribes them. `detach`
/// removes every subscription, which also releases the bus's references to
/// the controllers.
pub struct Console {
    bus: Arc<dyn EventBus>,
    tree: Arc<DeviceTreeController>,
    device_list: Arc<DeviceListController>,
    chart: Arc<ChartController>,
    warnings: Arc<WarningController>,
    forwarder_config: Arc<ForwarderConfigEditor>,
    server_config: Arc<ServerConfigEditor>,
    node_config: Arc<NodeConfigEditor>,
    status: Arc<StatusController>,
    tabs: Arc<TabController>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

impl Console {
    pub fn new(
        api: Arc<dyn PinicApi>,
        bus: Arc<dyn EventBus>,
        config: &ConsoleConfig,
    ) -> Result<Self, DomainError> {
        let converter = Arc::new(ValueConverter::default());
        let shared_tree = Arc::new(RwLock::new(DeviceTree::default()));

        let service = DeviceTreeService::new(
            Arc::clone(&api),
            Arc::clone(&bus),
            Arc::clone(&converter),
        );

        Ok(Self {
            tree: Arc::new(DeviceTreeController::new(
                service,
                Arc::clone(&bus),
                Arc::clone(&shared_tree),
                config.tree_refresh(),
            )),
            device_list: Arc::new(DeviceListController::new(
                Arc::clone(&bus),
                Arc::clone(&converter),
                shared_tree,
                config.chart_interval(),
            )),
            chart: Arc::new(ChartController::new(
                Arc::clone(&api),
                Arc::clone(&converter),
                config.chart_capacity,
            )?),
            warnings: Arc::new(WarningController::new(
                Arc::clone(&bus),
                converter,
                config.warning_log_len,
            )?),
            forwarder_config: Arc::new(ForwarderConfigEditor::new(
                Arc::clone(&api),
                Arc::clone(&bus),
            )),
            server_config: Arc::new(ServerConfigEditor::new(Arc::clone(&api), Arc::clone(&bus))),
            node_config: Arc::new(NodeConfigEditor::new(api, Arc::clone(&bus))),
            status: Arc::new(StatusController::new(Arc::clone(&bus))),
            tabs: Arc::new(TabController::new()),
            bus,
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    /// Subscribes every controller. Calling it twice is a no-op.
    pub fn attach(&self) {
        let mut subscriptions = self.lock_subscriptions();
        if !subscriptions.is_empty() {
            return;
        }

        let mut subscribe = |kinds: &[EventKind], handler: Arc<dyn EventHandler>| {
            subscriptions.push(self.bus.subscribe_all(kinds, handler));
        };
        subscribe(&DeviceTreeController::KINDS, self.tree.clone());
        subscribe(&DeviceListController::KINDS, self.device_list.clone());
        subscribe(&ChartController::KINDS, self.chart.clone());
        subscribe(&ForwarderConfigEditor::KINDS, self.forwarder_config.clone());
        subscribe(&ServerConfigEditor::KINDS, self.server_config.clone());
        subscribe(&NodeConfigEditor::KINDS, self.node_config.clone());
        subscribe(&StatusController::KINDS, self.status.clone());
        subscribe(&TabController::KINDS, self.tabs.clone());

        info!(subscriptions = subscriptions.len(), "console attached");
    }

    /// Removes every subscription made by `attach`.
    pub fn detach(&self) {
        let mut subscriptions = self.lock_subscriptions();
        for id in subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
        info!("console detached");
    }

    pub fn is_attached(&self) -> bool {
        !self.lock_subscriptions().is_empty()
    }

    /// Maps one push-channel event onto the bus.
    pub async fn handle_realtime(&self, event: RealtimeEvent) -> Result<(), DomainError> {
        match event {
            RealtimeEvent::Connected => {
                info!("forwarder channel connected");
                self.bus.publish(ConsoleEvent::ForwarderConnect).await
            }
            RealtimeEvent::Disconnected => {
                warn!("forwarder channel disconnected");
                self.bus.publish(ConsoleEvent::ForwarderDisconnect).await
            }
            RealtimeEvent::Warning(payload) => self.warnings.on_warning(payload).await,
        }
    }

    /// Attaches, then runs the tree refresh loop and the push channel until
    /// `shutdown` flips. Stops the chart and detaches on the way out.
    pub async fn run(
        &self,
        realtime: Option<Arc<dyn RealtimeChannel>>,
        shutdown: watch::Receiver<bool>,
    ) {
        self.attach();

        tokio::join!(
            self.tree.run(shutdown.clone()),
            self.pump_realtime(realtime, shutdown),
        );

        self.chart.clear();
        self.detach();
    }

    async fn pump_realtime(
        &self,
        realtime: Option<Arc<dyn RealtimeChannel>>,
        shutdown: watch::Receiver<bool>,
    ) {
        let Some(channel) = realtime else {
            info!("running without realtime channel");
            return;
        };
        let (tx, mut rx) = mpsc::channel(REALTIME_BUFFER);

        let channel_task = async move {
            match channel.run(tx, shutdown).await {
                Ok(()) => info!("realtime channel closed"),
                Err(e) => error!(error = %e, "realtime channel stopped"),
            }
        };
        let forward = async {
            while let Some(event) = rx.recv().await {
                if let Err(e) = self.handle_realtime(event).await {
                    warn!(error = %e, "handling realtime event failed");
                }
            }
        };

        tokio::join!(channel_task, forward);
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<SubscriptionId>> {
        self.subscriptions.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Accessors ===

    pub fn bus(&self) -> Arc<dyn EventBus> {
        Arc::clone(&self.bus)
    }

    pub fn tree(&self) -> &DeviceTreeController {
        &self.tree
    }

    pub fn device_list(&self) -> &DeviceListController {
        &self.device_list
    }

    pub fn chart(&self) -> &ChartController {
        &self.chart
    }

    pub fn warnings(&self) -> &WarningController {
        &self.warnings
    }

    pub fn forwarder_config(&self) -> &ForwarderConfigEditor {
        &self.forwarder_config
    }

    pub fn server_config(&self) -> &ServerConfigEditor {
        &self.server_config
    }

    pub fn node_config(&self) -> &NodeConfigEditor {
        &self.node_config
    }

    pub fn status(&self) -> &StatusController {
        &self.status
    }

    pub fn tabs(&self) -> &TabController {
        &self.tabs
    }
}
