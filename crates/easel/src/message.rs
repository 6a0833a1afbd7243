//! Addressed messages exchanged between components.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque, shareable message payload.
pub type Value = Arc<dyn Any + Send + Sync>;

/// An addressed payload: source, target, a kind tag, and an opaque value.
///
/// Messages are immutable once constructed and are consumed at most once by
/// the routing utilities. The kind [`Message::INIT`] is reserved for
/// bootstrap and is exempt from return-value delegation.
#[derive(Clone)]
pub struct Message {
    source: String,
    target: String,
    kind: String,
    value: Option<Value>,
}

impl Message {
    /// The reserved bootstrap message kind.
    pub const INIT: &'static str = "init";

    /// Create a new message.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        value: Option<Value>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: kind.into(),
            value,
        }
    }

    /// Create the bootstrap message for a component.
    pub fn init(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, None, Self::INIT)
    }

    /// The id of the sending context.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The id of the addressed component.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The message-kind tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether this is the reserved bootstrap message.
    pub fn is_init(&self) -> bool {
        self.kind == Self::INIT
    }

    /// The opaque payload, if any.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Downcast the payload to a concrete type.
    pub fn value_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("has_value", &self.value.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_message() {
        let message = Message::init("workbench", "editor");
        assert!(message.is_init());
        assert_eq!(message.source(), "workbench");
        assert_eq!(message.target(), "editor");
        assert!(message.value().is_none());
    }

    #[test]
    fn test_value_downcast() {
        let payload: Value = Arc::new(42_i32);
        let message = Message::new("a", "b", Some(payload), "update");

        assert!(!message.is_init());
        assert_eq!(message.value_as::<i32>().as_deref(), Some(&42));
        assert!(message.value_as::<String>().is_none());
    }
}
