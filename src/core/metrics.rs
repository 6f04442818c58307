//! Dispatch metrics for async appenders
//!
//! Counters for monitoring the health of an asynchronous dispatch buffer:
//! how many events were accepted, handed to children, discarded, or
//! dispatched synchronously because the buffer could not keep up.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by an [`AsyncAppender`](crate::appenders::AsyncAppender)
///
/// # Example
///
/// ```
/// use rust_logger_hierarchy::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
///
/// metrics.record_accepted();
/// metrics.record_discarded();
///
/// assert_eq!(metrics.accepted(), 1);
/// assert_eq!(metrics.discarded(), 1);
/// ```
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Events placed in the buffer
    accepted: AtomicU64,

    /// Events handed to the child appenders
    dispatched: AtomicU64,

    /// Events dropped by a discarding overflow policy
    discarded: AtomicU64,

    /// Number of times an event found the buffer full
    queue_full_events: AtomicU64,

    /// Number of times a producer waited for space
    block_events: AtomicU64,

    /// Events dispatched on the calling thread
    sync_fallbacks: AtomicU64,

    /// Panics that escaped child dispatch
    dispatch_failures: AtomicU64,
}

impl DispatchMetrics {
    pub const fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            sync_fallbacks: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sync_fallbacks(&self) -> u64 {
        self.sync_fallbacks.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatch_failures(&self) -> u64 {
        self.dispatch_failures.load(Ordering::Relaxed)
    }

    /// Record an accepted event, returning the previous count
    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.accepted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.discarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sync_fallback(&self) -> u64 {
        self.sync_fallbacks.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatch_failure(&self) -> u64 {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Discarded share of all events offered, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been offered yet.
    pub fn discard_rate(&self) -> f64 {
        let discarded = self.discarded() as f64;
        let total = self.accepted() as f64 + self.sync_fallbacks() as f64 + discarded;
        if total == 0.0 {
            0.0
        } else {
            (discarded / total) * 100.0
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.accepted.store(0, Ordering::Relaxed);
        self.dispatched.store(0, Ordering::Relaxed);
        self.discarded.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.sync_fallbacks.store(0, Ordering::Relaxed);
        self.dispatch_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DispatchMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            accepted: AtomicU64::new(self.accepted()),
            dispatched: AtomicU64::new(self.dispatched()),
            discarded: AtomicU64::new(self.discarded()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
            sync_fallbacks: AtomicU64::new(self.sync_fallbacks()),
            dispatch_failures: AtomicU64::new(self.dispatch_failures()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.accepted(), 0);
        assert_eq!(metrics.dispatched(), 0);
        assert_eq!(metrics.discarded(), 0);
        assert_eq!(metrics.sync_fallbacks(), 0);
        assert_eq!(metrics.dispatch_failures(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.record_discarded(), 0);
        assert_eq!(metrics.record_discarded(), 1);
        assert_eq!(metrics.discarded(), 2);
    }

    #[test]
    fn test_discard_rate() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.discard_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_accepted();
        }
        for _ in 0..10 {
            metrics.record_discarded();
        }
        let rate = metrics.discard_rate();
        assert!((rate - 10.0).abs() < 1e-9, "Discard rate was {}", rate);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let metrics = DispatchMetrics::new();
        metrics.record_sync_fallback();

        let snapshot = metrics.clone();
        metrics.record_sync_fallback();
        assert_eq!(snapshot.sync_fallbacks(), 1);
        assert_eq!(metrics.sync_fallbacks(), 2);

        metrics.reset();
        assert_eq!(metrics.sync_fallbacks(), 0);
    }
}
