//! Bounded sample window for a live chart.

use serde::Serialize;
use std::collections::VecDeque;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Smallest window that still draws a line.
pub const MIN_CAPACITY: usize = 2;
/// Largest window the console will keep.
pub const MAX_CAPACITY: usize = 1000;
/// Window used when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 40;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartSample {
    pub at: Timestamp,
    pub value: f64,
}

/// Ordered, time-bounded sequence of samples with FIFO eviction.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    capacity: usize,
    samples: VecDeque<ChartSample>,
}

impl SampleSeries {
    /// Creates an empty series holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self, ValidationError> {
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity) {
            return Err(ValidationError::out_of_range(
                "chart_capacity",
                MIN_CAPACITY as i64,
                MAX_CAPACITY as i64,
                capacity as i64,
            ));
        }
        Ok(Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Appends a sample, evicting the oldest once the window is full.
    ///
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: ChartSample) -> Option<ChartSample> {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn latest(&self) -> Option<&ChartSample> {
        self.samples.back()
    }

    /// Copy of the whole current window, oldest first.
    pub fn window(&self) -> Vec<ChartSample> {
        self.samples.iter().copied().collect()
    }
}

impl Default for SampleSeries {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            samples: VecDeque::with_capacity(DEFAULT_CAPACITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(secs: f64, value: f64) -> ChartSample {
        ChartSample {
            at: Timestamp::from_unix_secs_f64(secs).unwrap(),
            value,
        }
    }

    #[test]
    fn rejects_capacity_out_of_range() {
        assert!(SampleSeries::new(1).is_err());
        assert!(SampleSeries::new(MAX_CAPACITY + 1).is_err());
        assert!(SampleSeries::new(MIN_CAPACITY).is_ok());
    }

    #[test]
    fn push_evicts_oldest_when_full() {
        let mut series = SampleSeries::new(3).unwrap();
        for i in 0..3 {
            assert!(series.push(sample(i as f64, i as f64)).is_none());
        }

        let evicted = series.push(sample(3.0, 3.0));

        assert_eq!(evicted.map(|s| s.value), Some(0.0));
        let values: Vec<f64> = series.window().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.latest().map(|s| s.value), Some(3.0));
    }

    #[test]
    fn clear_empties_window() {
        let mut series = SampleSeries::default();
        series.push(sample(1.0, 1.0));
        series.clear();
        assert!(series.is_empty());
        assert_eq!(series.capacity(), DEFAULT_CAPACITY);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(capacity in MIN_CAPACITY..200usize, ticks in 0usize..600) {
            let mut series = SampleSeries::new(capacity).unwrap();
            for i in 0..ticks {
                series.push(sample(i as f64, i as f64));
                prop_assert!(series.len() <= capacity);
            }
            prop_assert_eq!(series.len(), ticks.min(capacity));
            if ticks > 0 {
                prop_assert_eq!(series.latest().map(|s| s.value), Some((ticks - 1) as f64));
            }
        }
    }
}
