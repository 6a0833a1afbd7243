//! UI-thread affinity tracking.
//!
//! All widget-tree mutation must happen on the single UI thread owned by the
//! dispatcher. The UI thread registers itself here when the application starts
//! (see [`crate::Application::init`]); afterwards, code that requires UI-thread
//! execution can verify affinity with [`is_ui_thread`] or the
//! [`debug_assert_ui_thread!`](crate::debug_assert_ui_thread) macro.

use std::sync::OnceLock;
use std::thread::ThreadId;

/// Global storage for the UI thread ID.
static UI_THREAD_ID: OnceLock<ThreadId> = OnceLock::new();

/// Register the current thread as the UI thread.
///
/// This is invoked on the dispatcher thread during [`crate::Application::init`].
/// It may only be called once per process.
///
/// # Panics
///
/// Panics if called again from a different thread.
pub fn set_ui_thread() {
    let current = std::thread::current().id();
    if UI_THREAD_ID.set(current).is_err() && UI_THREAD_ID.get() != Some(&current) {
        panic!("set_ui_thread() called from a different thread than the registered UI thread");
    }
}

/// Get the UI thread ID if it has been registered.
#[inline]
pub fn ui_thread_id() -> Option<ThreadId> {
    UI_THREAD_ID.get().copied()
}

/// Check if the current thread is the UI thread.
///
/// Returns `true` when no UI thread has been registered yet, so early
/// initialization and standalone dispatcher use are not penalized.
#[inline]
pub fn is_ui_thread() -> bool {
    match UI_THREAD_ID.get() {
        Some(&ui_id) => std::thread::current().id() == ui_id,
        None => true,
    }
}

/// Debug-assert that the current thread is the UI thread.
///
/// Compiles to nothing in release builds.
#[macro_export]
macro_rules! debug_assert_ui_thread {
    () => {
        debug_assert!(
            $crate::thread_affinity::is_ui_thread(),
            "this operation must run on the UI thread"
        );
    };
}
