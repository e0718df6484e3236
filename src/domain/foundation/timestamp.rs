//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Creates a timestamp from fractional Unix seconds, as reported by
    /// the backend (`time.time()` on the node side).
    ///
    /// Returns `None` for non-finite or out-of-range values.
    pub fn from_unix_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() {
            return None;
        }
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1_000_000_000.0).round() as u32;
        Utc.timestamp_opt(whole as i64, nanos.min(999_999_999))
            .single()
            .map(Self)
    }

    /// Returns the timestamp as fractional Unix seconds.
    pub fn as_unix_secs_f64(&self) -> f64 {
        self.0.timestamp() as f64 + f64::from(self.0.timestamp_subsec_nanos()) / 1e9
    }

    /// Wall-clock time of day in the local timezone, `HH:MM:SS`.
    pub fn clock_string(&self) -> String {
        self.0.with_timezone(&Local).format("%H:%M:%S").to_string()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn from_unix_secs_f64_keeps_fraction() {
        // 2024-01-15T00:00:00.5Z
        let ts = Timestamp::from_unix_secs_f64(1705276800.5).unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.as_datetime().day(), 15);
        assert_eq!(ts.as_datetime().nanosecond(), 500_000_000);
        assert!((ts.as_unix_secs_f64() - 1705276800.5).abs() < 1e-6);
    }

    #[test]
    fn from_unix_secs_f64_rejects_nan() {
        assert!(Timestamp::from_unix_secs_f64(f64::NAN).is_none());
        assert!(Timestamp::from_unix_secs_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn clock_string_is_hh_mm_ss() {
        let ts = Timestamp::from_unix_secs_f64(1705276800.0).unwrap();
        let clock = ts.clock_string();
        assert_eq!(clock.len(), 8);
        assert_eq!(clock.matches(':').count(), 2);
    }

    #[test]
    fn timestamp_ordering_works() {
        let ts1 = Timestamp::from_unix_secs_f64(10.0).unwrap();
        let ts2 = Timestamp::from_unix_secs_f64(11.0).unwrap();
        assert!(ts1 < ts2);
    }
}
