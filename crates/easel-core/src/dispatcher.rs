//! The UI-thread dispatcher.
//!
//! [`UiDispatcher`] owns one dedicated thread that drains a task queue, standing
//! in for a UI toolkit's single-threaded "run later" primitive. Work reaches the
//! UI thread either fire-and-forget via [`UiDispatcher::run_later`] or
//! synchronously via [`UiDispatcher::run_and_wait`], which blocks the submitting
//! thread on a condition-variable rendezvous until the task has executed.
//!
//! # Shutdown semantics
//!
//! The dispatcher carries the application-running flag. It has a single writer
//! ([`UiDispatcher::shutdown`]) and many lock-free readers; readers may observe
//! a stale `true` for up to one poll interval, which is tolerated. Once the
//! flag is cleared:
//!
//! - tasks already queued for synchronous execution are skipped rather than
//!   run, so no widget is mutated after shutdown has begun;
//! - threads blocked in [`UiDispatcher::run_and_wait`] re-check the flag on
//!   every wake and return promptly;
//! - neither case is reported as an error. Shutdown is not a failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::invocation::{QueuedInvocation, WaitOutcome, completion_pair};

/// Interval at which blocked bridge callers re-check the running flag.
pub const WAIT_POLL: Duration = Duration::from_millis(100);

/// Configuration for creating a dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Name for the UI thread.
    pub name: String,
    /// Stack size for the UI thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name: "easel-ui".to_string(),
            stack_size: None,
        }
    }
}

enum DispatcherTask {
    Invoke(QueuedInvocation),
    Shutdown,
}

/// A dedicated UI thread draining a FIFO task queue.
///
/// `UiDispatcher` is `Send + Sync`; any number of worker threads may submit
/// tasks concurrently. Tasks execute one at a time, in submission order, on
/// the dispatcher's own thread.
pub struct UiDispatcher {
    sender: Sender<DispatcherTask>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl UiDispatcher {
    /// Create a dispatcher with default configuration and start its thread.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Create a dispatcher with custom configuration.
    pub fn with_config(config: DispatcherConfig) -> Self {
        let (sender, receiver) = unbounded();
        let running = Arc::new(AtomicBool::new(true));

        let mut builder = thread::Builder::new().name(config.name);
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder
            .spawn(move || dispatch_loop(receiver))
            .expect("Failed to spawn UI dispatcher thread");

        Self {
            sender,
            running,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Check whether the application is still running.
    ///
    /// Lock-free; a reader may observe a stale `true` for one poll interval
    /// after shutdown begins.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// A cloneable handle on the running flag, for readers that outlive a
    /// borrow of the dispatcher.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Schedule a task on the UI thread without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DispatcherExited`] if the dispatcher has shut down.
    pub fn run_later<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.is_running() {
            return Err(CoreError::DispatcherExited);
        }
        self.sender
            .send(DispatcherTask::Invoke(QueuedInvocation::new(task)))
            .map_err(|_| CoreError::DispatcherExited)
    }

    /// Run a task on the UI thread and block until it has executed.
    ///
    /// The task runs at most once. If shutdown begins before the task executes
    /// it is skipped entirely and the call returns `Ok(())`; a shutdown race is
    /// not an error. The calling thread waits with a bounded interval
    /// ([`WAIT_POLL`]) and re-checks the running flag on every wake, so it
    /// never hangs past shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Execution`] if the task panicked; the panic payload
    /// message is preserved and the completion is still observed (no hang).
    pub fn run_and_wait<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let (handle, waiter) = completion_pair();

        let running = self.running.clone();
        let invocation = QueuedInvocation::with_completion(
            move || {
                // Skipped when shutdown has begun: no widget mutation after exit.
                if running.load(Ordering::Acquire) {
                    task();
                }
            },
            handle,
        );

        if self.sender.send(DispatcherTask::Invoke(invocation)).is_err() {
            // Dispatcher thread is gone; treat as the shutdown no-op case.
            return Ok(());
        }

        let running = self.running.clone();
        match waiter.wait_while(WAIT_POLL, move || running.load(Ordering::Acquire)) {
            WaitOutcome::Completed | WaitOutcome::Abandoned => Ok(()),
            WaitOutcome::Failed(message) => Err(CoreError::Execution(message)),
        }
    }

    /// Initiate shutdown.
    ///
    /// Clears the running flag first, then wakes the UI thread. Pending and
    /// in-flight bridge calls become no-ops and blocked waiters are released
    /// within one poll interval. Idempotent.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::info!(target: "easel_core::dispatcher", "shutdown requested");
        }
        let _ = self.sender.send(DispatcherTask::Shutdown);
    }

    /// Wait for the dispatcher thread to finish.
    ///
    /// Call [`UiDispatcher::shutdown`] first to initiate shutdown. Returns
    /// `true` if the thread was joined, `false` if already joined or panicked.
    pub fn join(&self) -> bool {
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            h.join().is_ok()
        } else {
            false
        }
    }

    /// Shut down and wait for the dispatcher thread to finish.
    pub fn shutdown_and_join(&self) -> bool {
        self.shutdown();
        self.join()
    }
}

impl Default for UiDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UiDispatcher {
    fn drop(&mut self) {
        self.shutdown();
        // Don't block in drop - just request shutdown
    }
}

/// The UI thread body: execute tasks in FIFO order until shutdown.
fn dispatch_loop(receiver: Receiver<DispatcherTask>) {
    tracing::debug!(target: "easel_core::dispatcher", "UI thread started");
    for task in receiver.iter() {
        match task {
            DispatcherTask::Invoke(invocation) => invocation.execute(),
            DispatcherTask::Shutdown => break,
        }
    }
    tracing::debug!(target: "easel_core::dispatcher", "UI thread exited");
}
