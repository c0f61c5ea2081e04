use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// A settable, cloneable cancellation flag
///
/// Tasks poll it with [`CancelSignal::is_cancelled`]. Waiters can block on
/// [`CancelSignal::receiver`] inside a `crossbeam_channel::select!`: the
/// channel never carries a message, it disconnects when the signal fires.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (trigger, receiver) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                receiver,
            }),
        }
    }

    /// Fire the signal; later calls are no-ops
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Channel that becomes disconnected once the signal fires
    pub fn receiver(&self) -> &Receiver<()> {
        &self.inner.receiver
    }

    /// Block until the signal fires
    pub fn wait(&self) {
        // Only ever returns Err(RecvError), on disconnect.
        let _ = self.inner.receiver.recv();
    }

    /// Fire the signal after `timeout` from a background timer thread
    pub fn cancel_after(&self, timeout: Duration) {
        let signal = self.clone();
        thread::spawn(move || {
            thread::sleep(timeout);
            if !signal.is_cancelled() {
                debug!("Cancelling after {:?}", timeout);
                signal.cancel();
            }
        });
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::select;
    use std::time::Instant;

    #[test]
    fn test_cancel_is_idempotent() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());

        signal.cancel();
        signal.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = CancelSignal::new();
        let other = signal.clone();

        other.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_receiver_wakes_select() {
        let signal = CancelSignal::new();
        let (_tx, idle) = bounded::<()>(1);

        let canceller = signal.clone();
        let handle = thread::spawn(move || canceller.cancel());

        select! {
            recv(signal.receiver()) -> msg => assert!(msg.is_err()),
            recv(idle) -> _ => panic!("idle channel never sends"),
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_after_fires() {
        let signal = CancelSignal::new();
        let start = Instant::now();

        signal.cancel_after(Duration::from_millis(20));
        signal.wait();

        assert!(signal.is_cancelled());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
