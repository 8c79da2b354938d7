/*!
 * Run-scoped one-shot cancellation
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// Cancellation signal shared by every thread of a run.
///
/// Polling goes through an atomic flag; blocked waits observe the signal as
/// a channel disconnection, so `select!` arms and sleeps wake promptly when
/// the token fires. Nothing is ever sent on the channel.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    flag: AtomicBool,
    keeper: Mutex<Option<Sender<()>>>,
    observer: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            inner: Arc::new(Inner {
                flag: AtomicBool::new(false),
                keeper: Mutex::new(Some(tx)),
                observer: rx,
            }),
        }
    }

    /// Fire the signal. Idempotent; later calls are no-ops.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        if let Ok(mut keeper) = self.inner.keeper.lock() {
            keeper.take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Channel end that disconnects when the token fires; for `select!`.
    pub fn observer(&self) -> &Receiver<()> {
        &self.inner.observer
    }

    /// Sleep for `duration`, waking early on cancellation.
    /// Returns false when the token fired before the sleep completed.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        matches!(
            self.inner.observer.recv_timeout(duration),
            Err(RecvTimeoutError::Timeout)
        )
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_starts_unset() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();

        token.cancel();

        assert!(clone.is_cancelled());
        token.cancel(); // idempotent
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_sleep_completes_when_not_cancelled() {
        let token = CancelToken::new();
        assert!(token.sleep(Duration::from_millis(5)));
    }

    #[test]
    fn test_cancel_wakes_a_blocked_sleep() {
        let token = CancelToken::new();
        let sleeper = token.clone();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            let completed = sleeper.sleep(Duration::from_secs(30));
            (completed, start.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        token.cancel();

        let (completed, elapsed) = handle.join().unwrap();
        assert!(!completed);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_sleep_returns_immediately_after_cancel() {
        let token = CancelToken::new();
        token.cancel();
        let start = Instant::now();
        assert!(!token.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
