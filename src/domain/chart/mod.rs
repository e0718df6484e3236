//! Chart module - live sample window and its sampling lifecycle.

mod series;
mod state;

pub use series::{ChartSample, SampleSeries, DEFAULT_CAPACITY, MAX_CAPACITY, MIN_CAPACITY};
pub use state::ChartState;
