//! Error types for the easel core runtime.

use std::fmt;

/// The main error type for easel core operations.
#[derive(Debug)]
pub enum CoreError {
    /// Application has already been initialized.
    AlreadyInitialized,
    /// Application has not been initialized yet.
    NotInitialized,
    /// The UI dispatcher has shut down and no longer accepts work.
    DispatcherExited,
    /// A task executed on the UI thread panicked; the payload message is preserved.
    Execution(String),
    /// The node ID is invalid or the node has been removed from the scene.
    InvalidNode,
    /// Attempted to attach a node under itself or one of its descendants.
    CircularAttachment,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => {
                write!(f, "Application has already been initialized")
            }
            Self::NotInitialized => {
                write!(f, "Application has not been initialized. Call Application::init() first")
            }
            Self::DispatcherExited => {
                write!(f, "The UI dispatcher has already shut down")
            }
            Self::Execution(msg) => {
                write!(f, "UI thread task failed: {msg}")
            }
            Self::InvalidNode => write!(f, "Invalid or removed scene node ID"),
            Self::CircularAttachment => {
                write!(f, "Cannot attach a node under itself or one of its descendants")
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// A specialized Result type for easel core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
