//! Per-component context: identity, activity, execution target, locale.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::error::{Result, WorkerError};
use crate::message::{Message, Value};

/// The directory service that delivers a message to its addressed component.
///
/// The framework treats listener resolution as opaque: a context either has a
/// listener or it does not. The default implementation is
/// [`crate::router::MessageRouter`].
pub trait ActionListener: Send + Sync {
    /// Deliver `message` to the component it addresses.
    fn notify_components(&self, message: Message);
}

/// Per-component metadata: id, active flag, execution target, locale.
///
/// Owned by exactly one component. The `active` flag is flipped by lifecycle
/// transitions; the framework relies on one lifecycle path being in flight per
/// component at a time rather than locking around the flag.
pub struct Context {
    id: String,
    active: AtomicBool,
    execution_target: Mutex<String>,
    locale_id: Mutex<String>,
    listener: RwLock<Option<Arc<dyn ActionListener>>>,
    /// Delegation slots filled by a component's handle logic and drained by
    /// the worker after each message (see
    /// [`crate::worker::delegate_return_value`]).
    return_target: Mutex<Option<String>>,
    return_value: Mutex<Option<Value>>,
}

impl Context {
    /// Create a context with the given id. Starts active with an empty
    /// execution target and locale.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            active: AtomicBool::new(true),
            execution_target: Mutex::new(String::new()),
            locale_id: Mutex::new(String::new()),
            listener: RwLock::new(None),
            return_target: Mutex::new(None),
            return_value: Mutex::new(None),
        }
    }

    /// The component id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the owning component is active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Flip the active flag. Deactivation is picked up by the component's
    /// runner, which then performs teardown.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// The declared execution target, `"perspectiveId.containerId"`.
    pub fn execution_target(&self) -> String {
        self.execution_target.lock().clone()
    }

    /// Set the declared execution target.
    pub fn set_execution_target(&self, target: impl Into<String>) {
        *self.execution_target.lock() = target.into();
    }

    /// The locale id.
    pub fn locale_id(&self) -> String {
        self.locale_id.lock().clone()
    }

    /// Set the locale id.
    pub fn set_locale_id(&self, locale_id: impl Into<String>) {
        *self.locale_id.lock() = locale_id.into();
    }

    /// The action listener resolved from this context, if any.
    pub fn action_listener(&self) -> Option<Arc<dyn ActionListener>> {
        self.listener.read().clone()
    }

    /// Install the action listener.
    pub fn set_action_listener(&self, listener: Arc<dyn ActionListener>) {
        *self.listener.write() = Some(listener);
    }

    /// Build a message from this context and deliver it through the listener.
    pub fn send(&self, target: impl Into<String>, value: Option<Value>) -> Result<()> {
        let listener = self
            .action_listener()
            .ok_or(WorkerError::ListenerUnavailable)?;
        listener.notify_components(Message::new(&self.id, target, value, ""));
        Ok(())
    }

    /// Stage a delegation target for the current message.
    ///
    /// The worker consumes this slot (and the return value) once per handled
    /// message; see [`Context::take_return_target`].
    pub fn set_return_target(&self, target: impl Into<String>) {
        *self.return_target.lock() = Some(target.into());
    }

    /// Stage a delegation value for the current message.
    pub fn set_return_value(&self, value: Value) {
        *self.return_value.lock() = Some(value);
    }

    /// Take and clear the staged delegation target.
    pub fn take_return_target(&self) -> Option<String> {
        self.return_target.lock().take()
    }

    /// Take and clear the staged delegation value.
    pub fn take_return_value(&self) -> Option<Value> {
        self.return_value.lock().take()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.is_active() == other.is_active()
            && *self.execution_target.lock() == *other.execution_target.lock()
            && *self.locale_id.lock() == *other.locale_id.lock()
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .field("execution_target", &*self.execution_target.lock())
            .field("locale_id", &*self.locale_id.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_active() {
        let context = Context::new("editor");
        assert!(context.is_active());
        assert_eq!(context.id(), "editor");
        assert!(context.execution_target().is_empty());
    }

    #[test]
    fn test_return_slots_are_taken_once() {
        let context = Context::new("editor");
        context.set_return_target("console");
        context.set_return_value(Arc::new("output".to_string()));

        assert_eq!(context.take_return_target().as_deref(), Some("console"));
        assert!(context.take_return_target().is_none());
        assert!(context.take_return_value().is_some());
        assert!(context.take_return_value().is_none());
    }

    #[test]
    fn test_send_without_listener_errors() {
        let context = Context::new("editor");
        assert!(matches!(
            context.send("console", None),
            Err(WorkerError::ListenerUnavailable)
        ));
    }

    #[test]
    fn test_equality_tracks_id_and_state() {
        let a = Context::new("editor");
        let b = Context::new("editor");
        assert_eq!(a, b);

        b.set_active(false);
        assert_ne!(a, b);
    }
}
