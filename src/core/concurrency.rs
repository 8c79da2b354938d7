/*!
 * Concurrency control for the walker pool
 *
 * A counting semaphore caps how many roots are being walked at once, so a
 * run against many roots does not flood a network share with parallel
 * metadata scans.
 */

use std::sync::{Arc, Condvar, Mutex};

/// A counting semaphore bounding concurrent root walks
#[derive(Clone)]
pub struct WalkerLimiter {
    state: Arc<SemaphoreState>,
}

struct SemaphoreState {
    available: Mutex<usize>,
    condvar: Condvar,
    max: usize,
}

impl WalkerLimiter {
    /// Create a limiter allowing `max_concurrent` simultaneous walks.
    /// Configuration validation guarantees the count is at least 1.
    pub fn new(max_concurrent: usize) -> Self {
        let max = max_concurrent.max(1);
        Self {
            state: Arc::new(SemaphoreState {
                available: Mutex::new(max),
                condvar: Condvar::new(),
                max,
            }),
        }
    }

    /// Acquire a permit, blocking until one is available
    pub fn acquire(&self) -> WalkerPermit {
        let mut available = self.state.available.lock().unwrap();

        while *available == 0 {
            available = self.state.condvar.wait(available).unwrap();
        }

        *available -= 1;

        WalkerPermit {
            state: self.state.clone(),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.state.max
    }

    pub fn available(&self) -> usize {
        *self.state.available.lock().unwrap()
    }
}

/// Permission to walk one root; released on drop
pub struct WalkerPermit {
    state: Arc<SemaphoreState>,
}

impl Drop for WalkerPermit {
    fn drop(&mut self) {
        let mut available = self.state.available.lock().unwrap();
        *available += 1;
        self.state.condvar.notify_one();
    }
}
