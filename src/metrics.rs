use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing request activity since startup.
#[derive(Default)]
pub struct ServiceMetrics {
    documents_uploaded: AtomicU64,
    fallback_writes: AtomicU64,
    questions_answered: AtomicU64,
    summaries_generated: AtomicU64,
}

impl ServiceMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stored upload; `durable` is false when it landed in the in-memory fallback.
    pub fn record_upload(&self, durable: bool) {
        self.documents_uploaded.fetch_add(1, Ordering::Relaxed);
        if !durable {
            self.fallback_writes.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a question answered by the model.
    pub fn record_answer(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a summary rendered to PDF.
    pub fn record_summary(&self) {
        self.summaries_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_uploaded: self.documents_uploaded.load(Ordering::Relaxed),
            fallback_writes: self.fallback_writes.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of request counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents accepted by `/upload`.
    pub documents_uploaded: u64,
    /// Uploads that were kept in memory because the primary store failed.
    pub fallback_writes: u64,
    /// Successful `/ask` calls.
    pub questions_answered: u64,
    /// Successful `/download_summary` calls.
    pub summaries_generated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_uploads_and_fallbacks() {
        let metrics = ServiceMetrics::new();
        metrics.record_upload(true);
        metrics.record_upload(false);
        metrics.record_answer();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_uploaded, 2);
        assert_eq!(snapshot.fallback_writes, 1);
        assert_eq!(snapshot.questions_answered, 1);
        assert_eq!(snapshot.summaries_generated, 0);
    }

    #[test]
    fn snapshot_starts_empty() {
        let snapshot = ServiceMetrics::new().snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                documents_uploaded: 0,
                fallback_writes: 0,
                questions_answered: 0,
                summaries_generated: 0,
            }
        );
    }
}
