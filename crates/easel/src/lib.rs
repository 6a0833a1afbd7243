//! Easel: a perspective/component workbench framework.
//!
//! Easel organizes a desktop application into *perspectives* (composite
//! components owning layout containers) and *components* (units of behavior
//! with an optional view). Components communicate exclusively through
//! addressed [`Message`]s; each component's messages are handled on its own
//! worker thread, while every mutation of the shared scene graph is bridged
//! onto the single UI thread provided by [`easel_core`].
//!
//! # Messaging
//!
//! ```
//! use std::sync::Arc;
//! use crossbeam_channel::unbounded;
//! use easel::{ActionListener, Context, Message, MessageRouter};
//!
//! let router = Arc::new(MessageRouter::new());
//! let (tx, rx) = unbounded();
//! router.register("console", tx);
//!
//! let context = Context::new("editor");
//! context.set_action_listener(router);
//! context.send("console", Some(Arc::new("saved".to_string())))?;
//!
//! let message = rx.try_recv().unwrap();
//! assert_eq!(message.source(), "editor");
//! assert_eq!(message.value_as::<String>().as_deref().map(String::as_str), Some("saved"));
//! # Ok::<(), easel::WorkerError>(())
//! ```
//!
//! # Lifecycle
//!
//! A component is bootstrapped by the reserved [`Message::INIT`] message and
//! driven by a [`ComponentRunner`]: handle on the worker thread, post-handle
//! and mounting on the UI thread, then return-value delegation and, if the
//! declared execution target changed, a hand-off to the owning
//! [`Perspective`] for re-parenting. Deactivating the component's [`Context`]
//! makes the runner tear it down and leave the perspective.

mod component;
mod context;
mod error;
mod lifecycle;
mod message;
mod perspective;
mod router;
mod runner;
pub mod worker;

pub use component::{ComponentBase, ComponentView, RenderMode, UiComponent, ViewResult};
pub use context::{ActionListener, Context};
pub use error::{Result, WorkerError};
pub use lifecycle::{LifecycleHooks, LifecyclePhase};
pub use message::{Message, Value};
pub use perspective::Perspective;
pub use router::MessageRouter;
pub use runner::{ComponentRunner, RunnerContext};
