//! Deferred invocations and the completion rendezvous used by the UI-thread bridge.
//!
//! A [`QueuedInvocation`] wraps a closure destined for the UI thread. When the
//! submitting thread needs to block until the closure has run, the invocation
//! carries a [`CompletionHandle`] whose paired [`CompletionWaiter`] parks the
//! submitter on a condition variable. Panics inside the closure are caught and
//! transported back through the same rendezvous instead of killing the UI
//! thread.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A type-erased invocation that can be executed later on the UI thread.
pub struct QueuedInvocation {
    /// The actual invocation closure.
    invoke: Box<dyn FnOnce() + Send>,
    /// Optional completion notifier for blocking submissions.
    completion: Option<CompletionHandle>,
}

impl QueuedInvocation {
    /// Create a new fire-and-forget invocation.
    pub fn new<F>(invoke: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            invoke: Box::new(invoke),
            completion: None,
        }
    }

    /// Create a new invocation with a completion handle for blocking submissions.
    pub fn with_completion<F>(invoke: F, completion: CompletionHandle) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            invoke: Box::new(invoke),
            completion: Some(completion),
        }
    }

    /// Execute the invocation, catching panics.
    ///
    /// A caught panic is forwarded to the waiter when one is attached;
    /// otherwise it is logged and dropped so the UI thread survives.
    pub fn execute(self) {
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(self.invoke));
        match (outcome, self.completion) {
            (Ok(()), Some(completion)) => completion.signal_done(),
            (Err(payload), Some(completion)) => {
                completion.signal_failure(panic_message(payload.as_ref()));
            }
            (Err(payload), None) => {
                tracing::error!(
                    target: "easel_core::invocation",
                    message = %panic_message(payload.as_ref()),
                    "panic in fire-and-forget UI task"
                );
            }
            (Ok(()), None) => {}
        }
    }
}

/// Extract a human-readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// A handle for signaling completion of a blocking invocation.
///
/// The executing side signals when the closure has finished (or failed),
/// allowing the submitting thread to unblock.
pub struct CompletionHandle {
    inner: Arc<CompletionState>,
}

impl CompletionHandle {
    /// Signal that the invocation completed normally.
    fn signal_done(self) {
        let mut done = self.inner.done.lock();
        *done = true;
        self.inner.condvar.notify_all();
    }

    /// Record a failure message, then signal completion.
    fn signal_failure(self, message: String) {
        *self.inner.failure.lock() = Some(message);
        let mut done = self.inner.done.lock();
        *done = true;
        self.inner.condvar.notify_all();
    }
}

/// Outcome of waiting on a blocking invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The invocation ran to completion.
    Completed,
    /// The invocation panicked; the payload message is preserved.
    Failed(String),
    /// Waiting was abandoned because the keep-waiting predicate turned false
    /// (application shutdown) before completion was signalled.
    Abandoned,
}

/// A waiter for blocking on invocation completion.
pub struct CompletionWaiter {
    inner: Arc<CompletionState>,
}

impl CompletionWaiter {
    /// Wait for the invocation to complete.
    ///
    /// # Warning
    ///
    /// Calling this from the UI thread for an invocation that is itself queued
    /// to the UI thread will deadlock. Use with caution.
    pub fn wait(self) -> WaitOutcome {
        self.wait_while(Duration::from_millis(100), || true)
    }

    /// Wait for the invocation to complete with a timeout.
    ///
    /// Returns `true` if the invocation completed, `false` if the timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut done = self.inner.done.lock();
        if *done {
            return true;
        }
        let result = self.inner.condvar.wait_for(&mut done, timeout);
        *done || !result.timed_out()
    }

    /// Wait for completion, re-evaluating `keep_waiting` at every wake.
    ///
    /// The wait is bounded by `interval` per sleep, so a change in the
    /// predicate is observed within one interval even without a notification.
    pub fn wait_while<F>(self, interval: Duration, keep_waiting: F) -> WaitOutcome
    where
        F: Fn() -> bool,
    {
        let mut done = self.inner.done.lock();
        while !*done && keep_waiting() {
            self.inner.condvar.wait_for(&mut done, interval);
        }
        if !*done {
            return WaitOutcome::Abandoned;
        }
        drop(done);
        match self.inner.failure.lock().take() {
            Some(message) => WaitOutcome::Failed(message),
            None => WaitOutcome::Completed,
        }
    }
}

struct CompletionState {
    done: Mutex<bool>,
    condvar: Condvar,
    failure: Mutex<Option<String>>,
}

/// Create a completion handle/waiter pair for blocking invocations.
pub fn completion_pair() -> (CompletionHandle, CompletionWaiter) {
    let state = Arc::new(CompletionState {
        done: Mutex::new(false),
        condvar: Condvar::new(),
        failure: Mutex::new(None),
    });

    (
        CompletionHandle {
            inner: state.clone(),
        },
        CompletionWaiter { inner: state },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_execute_fire_and_forget() {
        let executed = Arc::new(AtomicBool::new(false));

        let executed_clone = executed.clone();
        let invocation = QueuedInvocation::new(move || {
            executed_clone.store(true, Ordering::SeqCst);
        });

        invocation.execute();
        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_completion_pair() {
        let (handle, waiter) = completion_pair();

        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            handle.signal_done();
        });

        assert_eq!(waiter.wait(), WaitOutcome::Completed);
        thread.join().unwrap();
    }

    #[test]
    fn test_completion_with_invocation() {
        let executed = Arc::new(AtomicBool::new(false));
        let (handle, waiter) = completion_pair();

        let executed_clone = executed.clone();
        let invocation = QueuedInvocation::with_completion(
            move || {
                executed_clone.store(true, Ordering::SeqCst);
            },
            handle,
        );

        let thread = std::thread::spawn(move || invocation.execute());

        assert_eq!(waiter.wait(), WaitOutcome::Completed);
        thread.join().unwrap();
        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_panic_is_captured_and_completion_still_signalled() {
        let (handle, waiter) = completion_pair();
        let invocation = QueuedInvocation::with_completion(
            || panic!("boom in UI task"),
            handle,
        );

        let thread = std::thread::spawn(move || invocation.execute());

        match waiter.wait() {
            WaitOutcome::Failed(message) => assert!(message.contains("boom in UI task")),
            other => panic!("expected failure outcome, got {other:?}"),
        }
        thread.join().unwrap();
    }

    #[test]
    fn test_completion_timeout() {
        let (_handle, waiter) = completion_pair();

        // Never signalled, so the timeout must elapse.
        assert!(!waiter.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_while_abandons_when_predicate_turns_false() {
        let (_handle, waiter) = completion_pair();
        let keep_waiting = Arc::new(AtomicBool::new(true));

        let flag = keep_waiting.clone();
        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            flag.store(false, Ordering::SeqCst);
        });

        let outcome = waiter.wait_while(Duration::from_millis(5), || {
            keep_waiting.load(Ordering::SeqCst)
        });
        assert_eq!(outcome, WaitOutcome::Abandoned);
        thread.join().unwrap();
    }
}
