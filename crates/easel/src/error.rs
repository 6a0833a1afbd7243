//! Error types for the easel framework.

use std::fmt;

use easel_core::CoreError;

/// Errors raised by component workers and routing utilities.
#[derive(Debug)]
pub enum WorkerError {
    /// A post-handle hook returned a replacement root for a declarative
    /// component. Declarative components must not overwrite their
    /// markup-defined root; this is a programming mistake and is surfaced
    /// immediately.
    DeclarativeRootReplacement,
    /// A component's handle or post-handle logic failed.
    Execution(String),
    /// The originating context has no action listener registered.
    ListenerUnavailable,
    /// The component's message queue has been closed.
    QueueClosed,
    /// A core runtime error.
    Core(CoreError),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeclarativeRootReplacement => write!(
                f,
                "declarative components must not return a replacement root from post_handle, \
                 otherwise the markup-defined root node would be overwritten"
            ),
            Self::Execution(msg) => write!(f, "component handle failed: {msg}"),
            Self::ListenerUnavailable => {
                write!(f, "no action listener registered on the originating context")
            }
            Self::QueueClosed => write!(f, "the component's message queue is closed"),
            Self::Core(err) => write!(f, "core error: {err}"),
        }
    }
}

impl std::error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CoreError> for WorkerError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

/// A specialized Result type for easel framework operations.
pub type Result<T> = std::result::Result<T, WorkerError>;
