use std::sync::Mutex;

/// Frame-outcome counters, safe to read concurrently with processing.
pub struct MetricsRecorder {
    inner: Mutex<Counters>,
}

struct Counters {
    processed: usize,
    failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub processed: usize,
    pub failed: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Counters {
                processed: 0,
                failed: 0,
            }),
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.processed += 1;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.failed += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(counters) = self.inner.lock() {
            MetricsSnapshot {
                processed: counters.processed,
                failed: counters.failed,
            }
        } else {
            MetricsSnapshot {
                processed: 0,
                failed: 0,
            }
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_processed();
        metrics.record_processed();
        metrics.record_failed();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.processed, 2);
        assert_eq!(snapshot.failed, 1);
    }
}
