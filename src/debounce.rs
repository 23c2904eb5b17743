//! Cancel-and-restart debounce timer.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Debounces calls to a closure: each call cancels the previous pending one
/// and restarts the delay, so a rapid burst runs the closure once.
///
/// A zero delay runs the closure inline, as does calling from outside a
/// tokio runtime; this keeps debounced state usable from synchronous code.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `f`, cancelling any previously scheduled call.
    pub fn call(&self, f: impl FnOnce() + Send + 'static) {
        self.cancel();
        if self.delay.is_zero() || tokio::runtime::Handle::try_current().is_err() {
            f();
            return;
        }
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(handle);
        }
    }

    /// Cancel the pending call, if any.
    pub fn cancel(&self) {
        if let Ok(mut pending) = self.pending.lock()
            && let Some(handle) = pending.take()
        {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
