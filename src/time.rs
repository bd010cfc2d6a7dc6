use chrono::{DateTime, TimeZone, Utc};

/// Source of record timestamps.
pub trait TimeProvider: Send + Sync {
    /// Nanoseconds since the Unix epoch.
    fn current_time_nanos(&self) -> i64;
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn current_time_nanos(&self) -> i64 {
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

/// Always returns the same instant. Handy for deterministic output.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider(pub i64);

impl TimeProvider for FixedTimeProvider {
    fn current_time_nanos(&self) -> i64 {
        self.0
    }
}

pub(crate) fn nanos_to_datetime(nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos)
}
