//! ChartController - live sampling of one sensor.
//!
//! A single ticker task fires every `interval` and spawns one sample request
//! per tick without waiting for the previous one, so slow responses may
//! overlap. Every `init`, `stop` and `clear` bumps an epoch; a response that
//! comes back tagged with an older epoch is dropped instead of landing in a
//! buffer that no longer belongs to it.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::domain::chart::{ChartSample, ChartState, SampleSeries};
use crate::domain::conversion::ValueConverter;
use crate::domain::device::SensorSample;
use crate::domain::events::{ConsoleEvent, EventKind};
use crate::domain::foundation::{DomainError, ErrorCode, SensorPath, StateMachine, Timestamp};
use crate::ports::{EventHandler, PinicApi};

/// One full redraw of the chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartFrame {
    pub label: String,
    pub points: Vec<ChartSample>,
}

struct ChartInner {
    state: ChartState,
    sensor: Option<SensorPath>,
    interval: Duration,
    series: SampleSeries,
    epoch: u64,
    ticker: Option<JoinHandle<()>>,
}

impl ChartInner {
    fn transition(&mut self, target: ChartState, op: &str) -> Result<(), DomainError> {
        match self.state.transition_to(target) {
            Ok(next) => {
                debug!(from = ?self.state, to = ?next, "chart {}", op);
                self.state = next;
                Ok(())
            }
            Err(e) => {
                debug!(state = ?self.state, "ignoring chart {}", op);
                Err(DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                    .with_detail("operation", op))
            }
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn frame(&self) -> ChartFrame {
        ChartFrame {
            label: self
                .sensor
                .as_ref()
                .map(|s| s.sensor_id.to_string())
                .unwrap_or_default(),
            points: self.series.window(),
        }
    }
}

struct ChartShared {
    api: Arc<dyn PinicApi>,
    converter: Arc<ValueConverter>,
    inner: Mutex<ChartInner>,
    frames: watch::Sender<ChartFrame>,
}

impl ChartShared {
    fn lock(&self) -> MutexGuard<'_, ChartInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn redraw(&self, frame: ChartFrame) {
        self.frames.send_replace(frame);
    }

    async fn sample(&self, epoch: u64) {
        let sensor = {
            let inner = self.lock();
            match (&inner.sensor, inner.epoch == epoch) {
                (Some(sensor), true) => sensor.clone(),
                _ => return,
            }
        };

        match self.api.sensor_data(&sensor).await {
            Ok(reading) => self.record(epoch, reading),
            Err(e) => warn!(sensor = %sensor, error = %e, "chart sample failed"),
        }
    }

    fn record(&self, epoch: u64, reading: SensorSample) {
        let frame = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                debug!(epoch, current = inner.epoch, "dropping stale chart sample");
                return;
            }
            let at = Timestamp::from_unix_secs_f64(reading.timestamp).unwrap_or_else(Timestamp::now);
            let value = self
                .converter
                .convert_numeric(&reading.sensor_type, reading.raw_value);
            inner.series.push(ChartSample { at, value });
            inner.frame()
        };
        self.redraw(frame);
    }
}

pub struct ChartController {
    shared: Arc<ChartShared>,
}

impl ChartController {
    pub const KINDS: [EventKind; 1] = [EventKind::ShowChart];

    pub fn new(
        api: Arc<dyn PinicApi>,
        converter: Arc<ValueConverter>,
        capacity: usize,
    ) -> Result<Self, DomainError> {
        let (frames, _) = watch::channel(ChartFrame::default());
        Ok(Self {
            shared: Arc::new(ChartShared {
                api,
                converter,
                inner: Mutex::new(ChartInner {
                    state: ChartState::Uninitialized,
                    sensor: None,
                    interval: Duration::ZERO,
                    series: SampleSeries::new(capacity)?,
                    epoch: 0,
                    ticker: None,
                }),
                frames,
            }),
        })
    }

    pub fn state(&self) -> ChartState {
        self.shared.lock().state
    }

    pub fn sensor(&self) -> Option<SensorPath> {
        self.shared.lock().sensor.clone()
    }

    pub fn interval(&self) -> Duration {
        self.shared.lock().interval
    }

    /// Current window, oldest first.
    pub fn window(&self) -> Vec<ChartSample> {
        self.shared.lock().series.window()
    }

    /// Receives a frame on every redraw.
    pub fn frames(&self) -> watch::Receiver<ChartFrame> {
        self.shared.frames.subscribe()
    }

    /// Binds the chart to a sensor with an empty buffer.
    pub fn init(&self, sensor: SensorPath, interval: Duration) -> Result<(), DomainError> {
        if interval.is_zero() {
            return Err(DomainError::validation(
                "interval",
                "chart interval must be positive",
            ));
        }
        let frame = {
            let mut inner = self.shared.lock();
            inner.transition(ChartState::Initialized, "init")?;
            inner.sensor = Some(sensor);
            inner.interval = interval;
            inner.series.clear();
            inner.epoch += 1;
            inner.frame()
        };
        self.shared.redraw(frame);
        Ok(())
    }

    /// Starts the ticker. Valid from `Initialized` or `Stopped`.
    pub fn start(&self) -> Result<(), DomainError> {
        let mut inner = self.shared.lock();
        inner.transition(ChartState::Running, "start")?;
        let ticker = spawn_ticker(Arc::clone(&self.shared), inner.epoch, inner.interval);
        inner.ticker = Some(ticker);
        Ok(())
    }

    /// Cancels the ticker; responses still in flight are dropped.
    pub fn stop(&self) -> Result<(), DomainError> {
        let mut inner = self.shared.lock();
        inner.transition(ChartState::Stopped, "stop")?;
        inner.stop_ticker();
        inner.epoch += 1;
        Ok(())
    }

    /// Stops sampling and discards the buffer. A no-op when unbound.
    pub fn clear(&self) {
        let frame = {
            let mut inner = self.shared.lock();
            if !inner.state.is_bound() {
                return;
            }
            if inner.transition(ChartState::Uninitialized, "clear").is_err() {
                return;
            }
            inner.stop_ticker();
            inner.sensor = None;
            inner.series.clear();
            inner.epoch += 1;
            inner.frame()
        };
        self.shared.redraw(frame);
    }

    /// Restarts the chart on `sensor`.
    pub fn show(&self, sensor: SensorPath, interval: Duration) -> Result<(), DomainError> {
        self.clear();
        self.init(sensor, interval)?;
        self.start()
    }

    /// Takes one sample right now, outside the ticker.
    pub async fn sample_once(&self) {
        let epoch = self.shared.lock().epoch;
        self.shared.sample(epoch).await;
    }
}

fn spawn_ticker(shared: Arc<ChartShared>, epoch: u64, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { shared.sample(epoch).await });
        }
    })
}

impl Drop for ChartController {
    fn drop(&mut self) {
        self.shared.lock().stop_ticker();
    }
}

#[async_trait]
impl EventHandler for ChartController {
    async fn handle(&self, event: ConsoleEvent) -> Result<(), DomainError> {
        if let ConsoleEvent::ShowChart { sensor, interval } = event {
            self.show(sensor, interval)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ChartController"
    }
}
