use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Tracks how one search spent its work
///
/// Clones share the same counters, so a handle can be passed into the
/// search and read back afterwards.
#[derive(Debug, Clone)]
pub struct SearchMetrics {
    // Pending-counter bookkeeping
    increments: Arc<AtomicU64>,
    decrements: Arc<AtomicU64>,

    // Task placement
    tasks_dispatched: Arc<AtomicU64>,
    tasks_inline: Arc<AtomicU64>,
    tasks_skipped: Arc<AtomicU64>,
    backpressure_fallbacks: Arc<AtomicU64>,

    // Visits and matches
    nodes_visited: Arc<AtomicU64>,
    matches_published: Arc<AtomicU64>,
    matches_dropped: Arc<AtomicU64>,
}

impl SearchMetrics {
    /// Creates a new SearchMetrics instance
    pub fn new() -> Self {
        Self {
            increments: Arc::new(AtomicU64::new(0)),
            decrements: Arc::new(AtomicU64::new(0)),
            tasks_dispatched: Arc::new(AtomicU64::new(0)),
            tasks_inline: Arc::new(AtomicU64::new(0)),
            tasks_skipped: Arc::new(AtomicU64::new(0)),
            backpressure_fallbacks: Arc::new(AtomicU64::new(0)),
            nodes_visited: Arc::new(AtomicU64::new(0)),
            matches_published: Arc::new(AtomicU64::new(0)),
            matches_dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records one increment of the pending counter (including the seed)
    pub fn record_increment(&self) {
        self.increments.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one decrement of the pending counter
    pub fn record_decrement(&self) {
        self.decrements.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a child task handed to the pool
    pub fn record_dispatch(&self) {
        self.tasks_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a child task run on the current call stack
    pub fn record_inline(&self) {
        self.tasks_inline.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a pool task that found a cancellation signal set when it started
    pub fn record_skip(&self) {
        self.tasks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a dispatch that ran inline because the pool queue was full
    pub fn record_backpressure(&self) {
        self.backpressure_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_visit(&self) {
        self.nodes_visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a match, `accepted` being whether it won the result slot
    pub fn record_match(&self, accepted: bool) {
        if accepted {
            self.matches_published.fetch_add(1, Ordering::Relaxed);
        } else {
            self.matches_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Gets current statistics
    pub fn snapshot(&self) -> SearchStats {
        SearchStats {
            increments: self.increments.load(Ordering::Relaxed),
            decrements: self.decrements.load(Ordering::Relaxed),
            tasks_dispatched: self.tasks_dispatched.load(Ordering::Relaxed),
            tasks_inline: self.tasks_inline.load(Ordering::Relaxed),
            tasks_skipped: self.tasks_skipped.load(Ordering::Relaxed),
            backpressure_fallbacks: self.backpressure_fallbacks.load(Ordering::Relaxed),
            nodes_visited: self.nodes_visited.load(Ordering::Relaxed),
            matches_published: self.matches_published.load(Ordering::Relaxed),
            matches_dropped: self.matches_dropped.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.snapshot();
        debug!(
            "Search stats:\n\
             Pending counter increments/decrements: {}/{}\n\
             Tasks dispatched/inline/skipped: {}/{}/{}\n\
             Backpressure fallbacks: {}\n\
             Nodes visited: {}\n\
             Matches published/dropped: {}/{}",
            stats.increments,
            stats.decrements,
            stats.tasks_dispatched,
            stats.tasks_inline,
            stats.tasks_skipped,
            stats.backpressure_fallbacks,
            stats.nodes_visited,
            stats.matches_published,
            stats.matches_dropped
        );
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SearchMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub increments: u64,
    pub decrements: u64,
    pub tasks_dispatched: u64,
    pub tasks_inline: u64,
    pub tasks_skipped: u64,
    pub backpressure_fallbacks: u64,
    pub nodes_visited: u64,
    pub matches_published: u64,
    pub matches_dropped: u64,
}

impl SearchStats {
    /// True when every increment of the pending counter was matched by a decrement
    pub fn is_balanced(&self) -> bool {
        self.increments == self.decrements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_balance() {
        let metrics = SearchMetrics::new();

        metrics.record_increment();
        metrics.record_increment();
        metrics.record_decrement();
        assert!(!metrics.snapshot().is_balanced());

        metrics.record_decrement();
        let stats = metrics.snapshot();
        assert!(stats.is_balanced());
        assert_eq!(stats.increments, 2);
    }

    #[test]
    fn test_task_placement_tracking() {
        let metrics = SearchMetrics::new();

        metrics.record_dispatch();
        metrics.record_dispatch();
        metrics.record_inline();
        metrics.record_skip();
        metrics.record_backpressure();

        let stats = metrics.snapshot();
        assert_eq!(stats.tasks_dispatched, 2);
        assert_eq!(stats.tasks_inline, 1);
        assert_eq!(stats.tasks_skipped, 1);
        assert_eq!(stats.backpressure_fallbacks, 1);
    }

    #[test]
    fn test_match_tracking() {
        let metrics = SearchMetrics::new();

        metrics.record_match(true);
        metrics.record_match(false);
        metrics.record_match(false);

        let stats = metrics.snapshot();
        assert_eq!(stats.matches_published, 1);
        assert_eq!(stats.matches_dropped, 2);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = SearchMetrics::new();
        let handle = metrics.clone();

        handle.record_visit();
        handle.record_visit();

        assert_eq!(metrics.snapshot().nodes_visited, 2);
    }
}
