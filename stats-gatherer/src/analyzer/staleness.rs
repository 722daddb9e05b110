use chrono::{
    DateTime,
    Utc,
};
use std::time::Duration;

/// Decides whether a traffic-drained executor has been idle for too long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessDetector {
    threshold: Duration,
}

impl StalenessDetector {
    pub const DEFAULT_THRESHOLD: Duration = Duration::from_secs(24 * 60 * 60);

    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Stale once strictly more than the threshold elapsed since `drained_since`.
    /// Markers from the future are never stale.
    pub fn is_stale(&self, drained_since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(drained_since)
            .to_std()
            .is_ok_and(|elapsed| elapsed > self.threshold)
    }
}

impl Default for StalenessDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}
