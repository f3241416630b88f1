// Dependency Tree Progress
// Throttled progress events emitted while a tree is being built

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum spacing between two progress events (~5 per second)
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(180);

/// Event payload for tree-building progress
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildProgress {
    /// Packages whose metadata has been requested so far
    pub scanned: usize,
    pub current: String,
    pub depth: usize,
    /// Distinct names claimed so far
    pub unique: usize,
}

/// Observer for tree-building progress
pub type ProgressCallback = Arc<dyn Fn(&BuildProgress) + Send + Sync>;

/// Rate limiter in front of a progress callback
pub struct ProgressThrottle {
    callback: ProgressCallback,
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(callback: ProgressCallback) -> Self {
        Self::with_interval(callback, PROGRESS_INTERVAL)
    }

    pub fn with_interval(callback: ProgressCallback, interval: Duration) -> Self {
        Self {
            callback,
            interval,
            last_emit: None,
        }
    }

    /// Forward `event` unless one was forwarded less than `interval` ago
    pub fn offer(&mut self, event: &BuildProgress) -> bool {
        self.offer_at(event, Instant::now())
    }

    fn offer_at(&mut self, event: &BuildProgress, now: Instant) -> bool {
        let due = self
            .last_emit
            .map_or(true, |last| now.duration_since(last) > self.interval);
        if due {
            (self.callback)(event);
            self.last_emit = Some(now);
        }
        due
    }
}
