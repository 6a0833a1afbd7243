//! Core runtime for easel.
//!
//! This crate provides the foundation the easel framework is built on:
//!
//! - **UI Dispatcher**: one dedicated UI thread draining a FIFO task queue,
//!   the stand-in for a UI toolkit's single-threaded "run later" primitive
//! - **Invocation Bridge**: blocking cross-thread execution with a
//!   condition-variable rendezvous, panic capture, and cooperative
//!   shutdown-aware waiting
//! - **Application**: global application state and lifecycle management
//! - **Scene Graph**: the container tree whose nodes carry the
//!   visible/disabled/managed view-state flags lifecycle operations toggle
//! - **Thread Affinity**: registration and verification of the UI thread
//!
//! # Bridge Example
//!
//! ```
//! use easel_core::UiDispatcher;
//!
//! let dispatcher = UiDispatcher::new();
//!
//! // Runs on the dispatcher's UI thread; the caller blocks until done.
//! dispatcher.run_and_wait(|| {
//!     // mutate widgets here
//! }).unwrap();
//!
//! dispatcher.shutdown_and_join();
//! ```
//!
//! # Scene Example
//!
//! ```
//! use easel_core::SharedSceneGraph;
//!
//! let scene = SharedSceneGraph::new();
//! let container = scene.create_node("container");
//! let child = scene.create_node("child");
//!
//! scene.attach(container, child).unwrap();
//! scene.set_view_state(child, true).unwrap();
//! assert!(scene.flags(child).unwrap().visible);
//! ```

mod application;
mod dispatcher;
mod error;
pub mod invocation;
mod scene;
pub mod thread_affinity;

pub use application::Application;
pub use dispatcher::{DispatcherConfig, UiDispatcher, WAIT_POLL};
pub use error::{CoreError, Result};
pub use invocation::{CompletionHandle, CompletionWaiter, QueuedInvocation, WaitOutcome, completion_pair};
pub use scene::{NodeId, SceneGraph, SharedSceneGraph, ViewFlags};
pub use thread_affinity::{is_ui_thread, set_ui_thread, ui_thread_id};
