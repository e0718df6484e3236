//! WarningController - turns pushed warnings into highlights and log rows.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::conversion::ValueConverter;
use crate::domain::events::ConsoleEvent;
use crate::domain::foundation::DomainError;
use crate::domain::warning::{WarningItem, WarningLog, WarningPayload};
use crate::ports::{EventBus, EventPublisher};

/// Label used for every entry pushed by the forwarder.
pub const ALARM_KIND: &str = "Alarm";

pub struct WarningController {
    bus: Arc<dyn EventBus>,
    converter: Arc<ValueConverter>,
    log: RwLock<WarningLog>,
}

impl WarningController {
    pub fn new(
        bus: Arc<dyn EventBus>,
        converter: Arc<ValueConverter>,
        max_len: usize,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            bus,
            converter,
            log: RwLock::new(WarningLog::new(max_len)?),
        })
    }

    /// Highlights the device path, then records the entry.
    ///
    /// The entry is recorded even if a highlight handler fails; the handler
    /// error is returned afterwards.
    pub async fn on_warning(&self, payload: WarningPayload) -> Result<(), DomainError> {
        let sensor = payload.sensor_path();
        info!(sensor = %sensor, raw_value = payload.raw_value, "warning received");

        let highlighted = self
            .bus
            .publish(ConsoleEvent::ShowWarning {
                sensor: sensor.clone(),
                raw_value: payload.raw_value,
            })
            .await;

        let item = WarningItem {
            time: payload.observed_at().clock_string(),
            device: format!("{}/{}", sensor.server_id, sensor.node_id),
            sensor_id: payload.sensor_id.clone(),
            sensor_type: payload.sensor_type.clone(),
            kind: ALARM_KIND.to_string(),
            value: self.converter.display(&payload.sensor_type, payload.raw_value),
        };
        self.log.write().await.record(item);

        highlighted
    }

    /// Decodes raw event data and forwards it; malformed data is dropped.
    pub async fn on_event_data(&self, data: &Value) -> Result<(), DomainError> {
        match WarningPayload::from_event_data(data) {
            Ok(payload) => self.on_warning(payload).await,
            Err(e) => {
                warn!(error = %e, "dropping malformed warning");
                Ok(())
            }
        }
    }

    /// Most recent first.
    pub async fn items(&self) -> Vec<WarningItem> {
        self.log.read().await.items()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryEventBus;
    use crate::domain::events::EventKind;
    use crate::domain::foundation::{NodeId, SensorId, SensorPath, ServerId};
    use crate::domain::warning::WarningNode;
    use serde_json::json;

    fn payload(sensor: &str, raw: f64) -> WarningPayload {
        WarningPayload {
            timestamp: 1_700_000_000.0,
            sensor_id: SensorId::new(sensor),
            raw_value: raw,
            sensor_type: "tlc1549".to_string(),
            server: ServerId::new("S-1"),
            node: WarningNode {
                id: NodeId::new("N-1"),
            },
        }
    }

    fn controller(bus: Arc<InMemoryEventBus>, max_len: usize) -> WarningController {
        WarningController::new(bus, Arc::new(ValueConverter::default()), max_len).unwrap()
    }

    #[tokio::test]
    async fn publishes_highlight_and_records_entry() {
        let bus = Arc::new(InMemoryEventBus::recording());
        let warnings = controller(bus.clone(), 6);

        warnings.on_warning(payload("X-1", 512.0)).await.unwrap();

        assert_eq!(
            bus.last_event(EventKind::ShowWarning),
            Some(ConsoleEvent::ShowWarning {
                sensor: SensorPath::new("S-1", "N-1", "X-1"),
                raw_value: 512.0,
            })
        );
        let items = warnings.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].device, "S-1/N-1");
        assert_eq!(items[0].kind, "Alarm");
        assert_eq!(items[0].value, "250.00Ω");
        assert_eq!(items[0].time.len(), 8);
    }

    #[tokio::test]
    async fn log_is_bounded_and_newest_first() {
        let warnings = controller(Arc::new(InMemoryEventBus::new()), 3);

        for i in 0..5 {
            warnings
                .on_warning(payload(&format!("X-{}", i), 1.0))
                .await
                .unwrap();
        }

        let ids: Vec<String> = warnings
            .items()
            .await
            .iter()
            .map(|i| i.sensor_id.to_string())
            .collect();
        assert_eq!(ids, vec!["X-4", "X-3", "X-2"]);
    }

    #[tokio::test]
    async fn decodes_wrapped_event_data() {
        let warnings = controller(Arc::new(InMemoryEventBus::new()), 6);
        let inner = serde_json::to_string(&payload("X-9", 2.0)).unwrap();

        warnings.on_event_data(&json!({ "data": inner })).await.unwrap();

        assert_eq!(warnings.items().await[0].sensor_id.as_str(), "X-9");
    }

    #[tokio::test]
    async fn drops_malformed_event_data() {
        let bus = Arc::new(InMemoryEventBus::recording());
        let warnings = controller(bus.clone(), 6);

        warnings.on_event_data(&json!("not json")).await.unwrap();

        assert!(warnings.is_empty().await);
        assert!(!bus.has_event(EventKind::ShowWarning));
    }

    #[test]
    fn rejects_zero_length_log() {
        let result = WarningController::new(
            Arc::new(InMemoryEventBus::new()),
            Arc::new(ValueConverter::default()),
            0,
        );
        assert!(result.is_err());
    }
}
