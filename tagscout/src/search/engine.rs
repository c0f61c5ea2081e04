use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use tracing::{debug, info, trace};

use super::{CancelSignal, SearchOptions, SearchOutcome};
use crate::metrics::SearchMetrics;
use crate::node::TreeNode;
use crate::pool::{PoolHandle, Task, TaskPool};

/// Coordination state shared by every task of one search
struct SearchState<'a, N: TreeNode> {
    target: String,
    fan_out_threshold: usize,
    pending: AtomicUsize,
    claimed: AtomicBool,
    result: Sender<&'a N>,
    exhausted: Sender<()>,
    external: CancelSignal,
    internal: CancelSignal,
    metrics: SearchMetrics,
}

impl<'a, N: TreeNode> SearchState<'a, N> {
    fn is_cancelled(&self) -> bool {
        self.external.is_cancelled() || self.internal.is_cancelled()
    }

    fn acquire(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.metrics.record_increment();
    }

    fn release(&self) {
        self.metrics.record_decrement();
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            trace!("Pending counter reached zero");
            // Only the 1 -> 0 transition gets here, and the slot starts empty.
            let _ = self.exhausted.try_send(());
        }
    }

    /// Offer a match to the result slot without ever blocking
    fn publish(&self, node: &'a N) {
        // The slot is drained by the waiting caller, so a flag keeps it single-write.
        let accepted = self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if accepted {
            let _ = self.result.try_send(node);
            debug!("Published match for '{}'", self.target);
        } else {
            debug!("Dropped duplicate match for '{}'", self.target);
        }
        self.metrics.record_match(accepted);
        self.internal.cancel();
    }
}

/// Releases one unit of the pending counter when dropped
struct PendingGuard<'s, 'a, N: TreeNode> {
    state: &'s SearchState<'a, N>,
}

impl<'s, 'a, N: TreeNode> Drop for PendingGuard<'s, 'a, N> {
    fn drop(&mut self) {
        self.state.release();
    }
}

/// Entry point of a task taken off the pool queue
fn run_dispatched<'s, 'a: 's, N: TreeNode>(
    state: &'s SearchState<'a, N>,
    pool: &PoolHandle<'s>,
    node: &'a N,
) {
    let _guard = PendingGuard { state };
    if state.is_cancelled() {
        state.metrics.record_skip();
        return;
    }
    visit(state, pool, node);
}

/// Entry point of a task run on the current call stack
fn run_inline<'s, 'a: 's, N: TreeNode>(
    state: &'s SearchState<'a, N>,
    pool: &PoolHandle<'s>,
    node: &'a N,
) {
    let _guard = PendingGuard { state };
    visit(state, pool, node);
}

fn visit<'s, 'a: 's, N: TreeNode>(state: &'s SearchState<'a, N>, pool: &PoolHandle<'s>, node: &'a N) {
    state.metrics.record_visit();
    trace!("Visiting '{}'", node.name());

    if node.name() == state.target {
        state.publish(node);
        return;
    }

    let children = node.children();
    if children.len() >= state.fan_out_threshold {
        for child in children {
            if state.is_cancelled() {
                debug!("Stopped dispatching children of '{}'", node.name());
                return;
            }
            state.acquire();
            dispatch(state, pool, child);
        }
    } else {
        for child in children {
            state.acquire();
            state.metrics.record_inline();
            run_inline(state, pool, child);
        }
    }
}

fn dispatch<'s, 'a: 's, N: TreeNode>(state: &'s SearchState<'a, N>, pool: &PoolHandle<'s>, node: &'a N) {
    let handle = pool.clone();
    let task: Task<'s> = Box::new(move || run_dispatched(state, &handle, node));

    match pool.try_schedule(task) {
        Ok(()) => state.metrics.record_dispatch(),
        Err(task) => {
            // Dispatching runs on a worker; blocking on our own full queue
            // could stall every worker at once.
            state.metrics.record_backpressure();
            task();
        }
    }
}

fn await_outcome<'a, N: TreeNode>(
    state: &SearchState<'a, N>,
    result: &Receiver<&'a N>,
    exhausted: &Receiver<()>,
) -> SearchOutcome<&'a N> {
    select! {
        recv(state.external.receiver()) -> _ => {
            debug!("Search for '{}' cancelled by caller", state.target);
            SearchOutcome::NotFound
        }
        recv(state.internal.receiver()) -> _ => result.try_recv().ok().into(),
        recv(result) -> found => found.ok().into(),
        // A match published by the last task races its own exhaustion report.
        recv(exhausted) -> _ => result.try_recv().ok().into(),
    }
}

/// Searches `root` for the first node named `target` with default options
pub fn search<'a, N: TreeNode>(
    external: &CancelSignal,
    root: Option<&'a N>,
    target: &str,
) -> SearchOutcome<&'a N> {
    search_with(&SearchOptions::default(), external, root, target)
}

/// Searches `root` for the first node named `target`
pub fn search_with<'a, N: TreeNode>(
    options: &SearchOptions,
    external: &CancelSignal,
    root: Option<&'a N>,
    target: &str,
) -> SearchOutcome<&'a N> {
    search_with_metrics(options, external, root, target, &SearchMetrics::new())
}

/// Searches `root` for the first node named `target`, recording into `metrics`
///
/// Blocks until a match is published, the tree is exhausted or `external`
/// fires. The pool is joined before this returns on every path. A panic
/// raised by a [`TreeNode`] method is re-raised here after the join.
pub fn search_with_metrics<'a, N: TreeNode>(
    options: &SearchOptions,
    external: &CancelSignal,
    root: Option<&'a N>,
    target: &str,
    metrics: &SearchMetrics,
) -> SearchOutcome<&'a N> {
    let Some(root) = root else {
        debug!("No root node, nothing to search");
        return SearchOutcome::NotFound;
    };

    info!(
        "Starting search for '{}' with {} workers",
        target, options.pool_capacity
    );

    let (result_tx, result_rx) = bounded(1);
    let (exhausted_tx, exhausted_rx) = bounded(1);
    let state = SearchState {
        target: target.to_string(),
        fan_out_threshold: options.fan_out_threshold,
        pending: AtomicUsize::new(1),
        claimed: AtomicBool::new(false),
        result: result_tx,
        exhausted: exhausted_tx,
        external: external.clone(),
        internal: CancelSignal::new(),
        metrics: metrics.clone(),
    };
    state.metrics.record_increment();

    let outcome = thread::scope(|scope| {
        let pool = TaskPool::new(scope, options.pool_capacity);
        let state = &state;

        let handle = pool.handle();
        pool.schedule(move || run_dispatched(state, &handle, root));

        let outcome = await_outcome(state, &result_rx, &exhausted_rx);
        state.internal.cancel();
        pool.wait();
        outcome
    });

    metrics.log_stats();
    info!(
        "Search for '{}' {}",
        target,
        if outcome.is_found() { "found a match" } else { "found nothing" }
    );
    outcome
}
