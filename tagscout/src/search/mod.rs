//! Concurrent first-match lookup of a node by name.
//!
//! # How a search runs
//!
//! One call to [`search`] owns a fresh [`crate::pool::TaskPool`] and an
//! internal [`CancelSignal`] for its whole duration. The root is handed to the
//! pool as the first task; from there each task decides per node:
//!
//! 1. **Match**: the node's name equals the target. The node is offered to a
//!    single-slot result holder (first writer wins, later matches are
//!    dropped without blocking) and the internal signal fires.
//! 2. **Wide node** (children >= fan-out threshold): each child becomes its
//!    own pool task. Both cancellation signals are checked before every
//!    dispatch.
//! 3. **Narrow node**: children are searched on the current call stack,
//!    without cancellation checks.
//!
//! A pending counter tracks every task, inline or pooled. It starts at one
//! (the root), goes up before each descent and down when a task finishes.
//! The decrement that takes it to zero reports exhaustion.
//!
//! The caller is released by whichever comes first: its own signal, a
//! published match, or exhaustion. Before returning, the internal signal is
//! fired and the pool is joined, so queued tasks skip their work and no
//! worker outlives the call.
//!
//! # Results
//!
//! ```rust,ignore
//! let shutdown = CancelSignal::new();
//! match search(&shutdown, Some(&tree), "H") {
//!     SearchOutcome::Found(node) => println!("{}", node.name()),
//!     SearchOutcome::NotFound => println!("no such tag"),
//! }
//! ```
//!
//! An absent root, a missing name and a cancelled search all give
//! [`SearchOutcome::NotFound`]. Callers that need to tell cancellation apart
//! check their own signal.

pub mod cancel;
pub mod engine;

use std::num::NonZeroUsize;

pub use cancel::CancelSignal;
pub use engine::{search, search_with, search_with_metrics};

/// Default number of pool workers per search
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// Default child count at which a node's children go to the pool
pub const DEFAULT_FAN_OUT_THRESHOLD: usize = 10;

/// Outcome of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    Found(T),
    NotFound,
}

impl<T> SearchOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            SearchOutcome::Found(value) => Some(value),
            SearchOutcome::NotFound => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SearchOutcome<U> {
        match self {
            SearchOutcome::Found(value) => SearchOutcome::Found(f(value)),
            SearchOutcome::NotFound => SearchOutcome::NotFound,
        }
    }
}

impl<T> From<Option<T>> for SearchOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => SearchOutcome::Found(value),
            None => SearchOutcome::NotFound,
        }
    }
}

/// Tunables for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Worker threads in the pool, also the queue's capacity
    pub pool_capacity: NonZeroUsize,

    /// Child count at or above which children are dispatched to the pool
    pub fan_out_threshold: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            pool_capacity: NonZeroUsize::new(DEFAULT_POOL_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            fan_out_threshold: DEFAULT_FAN_OUT_THRESHOLD,
        }
    }
}
