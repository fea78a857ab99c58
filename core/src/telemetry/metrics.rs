use std::sync::Mutex;

/// Counters describing how the event channel has behaved so far.
pub struct SyncMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempts: usize,
    /// Envelopes that changed the snapshot.
    pub applied: usize,
    pub ignored: usize,
    pub dropped: usize,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    /// Records a connection attempt and returns the running total.
    pub fn record_attempt(&self) -> usize {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.attempts += 1;
            metrics.attempts
        } else {
            0
        }
    }

    pub fn record_applied(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.applied += 1;
        }
    }

    pub fn record_ignored(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.ignored += 1;
        }
    }

    pub fn record_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dropped += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}
