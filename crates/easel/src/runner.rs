//! The per-component worker loop.
//!
//! Each started component gets a dedicated worker thread draining its message
//! queue in FIFO order. For every message the runner:
//!
//! 1. runs the view's handle logic on the worker thread,
//! 2. bridges the post-handle step and any scene mutation onto the UI thread
//!    and waits for it,
//! 3. delegates a staged return value to its target,
//! 4. enqueues the component for re-parenting if its target changed.
//!
//! The loop exits when the component's context is deactivated or the
//! application shuts down. On deactivation the runner detaches the
//! component's root on the UI thread, runs teardown exactly once, and only
//! then removes the component from its perspective.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::RecvTimeoutError;
use easel_core::{NodeId, SharedSceneGraph, UiDispatcher, WAIT_POLL};
use parking_lot::Mutex;

use crate::component::UiComponent;
use crate::error::Result;
use crate::message::Message;
use crate::perspective::Perspective;
use crate::worker;

/// Everything a component runner needs besides the component itself.
#[derive(Clone)]
pub struct RunnerContext {
    /// The scene graph holding container and root nodes.
    pub scene: SharedSceneGraph,
    /// The UI dispatcher used for bridged execution.
    pub dispatcher: Arc<UiDispatcher>,
    /// The perspective hosting the component.
    pub perspective: Arc<Perspective>,
    /// The container the component mounts into on bootstrap.
    pub container: NodeId,
}

/// Spawns and drives per-component worker threads.
pub struct ComponentRunner;

impl ComponentRunner {
    /// Spawn the worker loop for `component` on a dedicated named thread.
    ///
    /// The component should already be registered with the perspective; the
    /// bootstrap "init" message is typically the first message in its queue.
    pub fn spawn(component: Arc<UiComponent>, ctx: RunnerContext) -> JoinHandle<()> {
        let name = format!("easel-component-{}", component.context().id());
        thread::Builder::new()
            .name(name)
            .spawn(move || run_loop(component, ctx))
            .expect("Failed to spawn component worker thread")
    }
}

fn run_loop(component: Arc<UiComponent>, ctx: RunnerContext) {
    tracing::debug!(
        target: "easel::runner",
        component = component.context().id(),
        "worker loop started"
    );

    let receiver = component.base().receiver().clone();
    while ctx.dispatcher.is_running() && component.context().is_active() {
        match receiver.recv_timeout(WAIT_POLL) {
            Ok(message) => {
                if let Err(err) = process_message(&component, &ctx, &message) {
                    tracing::error!(
                        target: "easel::runner",
                        component = component.context().id(),
                        kind = message.kind(),
                        error = %err,
                        "message handling failed"
                    );
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if !component.context().is_active() {
        tear_down(&component, &ctx);
    }

    tracing::debug!(
        target: "easel::runner",
        component = component.context().id(),
        "worker loop exited"
    );
}

fn process_message(
    component: &Arc<UiComponent>,
    ctx: &RunnerContext,
    message: &Message,
) -> Result<()> {
    // Handle runs here, on the worker thread.
    let handle_result = worker::run_handle(component, message)?;

    // Post-handle and all scene mutation are bridged to the UI thread; the
    // worker blocks until the UI thread has caught up.
    let ui_outcome: Arc<Mutex<Result<()>>> = Arc::new(Mutex::new(Ok(())));
    {
        let outcome = ui_outcome.clone();
        let component = component.clone();
        let scene = ctx.scene.clone();
        let message = message.clone();
        let container = ctx.container;
        worker::run_on_ui_thread_and_wait(&ctx.dispatcher, move || {
            let result = worker::execute_post_handle(&scene, &component, handle_result, &message)
                .and_then(|()| {
                    if message.is_init() {
                        worker::add_component_to_container(&scene, container, &component)
                    } else {
                        Ok(())
                    }
                });
            *outcome.lock() = result;
        })?;
    }
    take_outcome(&ui_outcome)?;

    // First successful bootstrap flips the started flag and runs the
    // post-create hooks.
    if message.is_init() && !component.base().is_started() {
        component.base().set_started(true);
        component
            .hooks()
            .run(crate::lifecycle::LifecyclePhase::PostCreate);
    }

    // Delegation never fires for "init" or without a staged value/target.
    let return_target = component.context().take_return_target();
    let return_value = component.context().take_return_value();
    worker::delegate_return_value(component, return_target.as_deref(), return_value, message)?;

    if worker::relocate_if_target_changed(&ctx.perspective.handoff_sender(), component) {
        // The perspective drains its own queue on the UI thread.
        let perspective = ctx.perspective.clone();
        let scene = ctx.scene.clone();
        let _ = ctx.dispatcher.run_later(move || {
            perspective.process_handoff(&scene);
        });
    }

    Ok(())
}

fn take_outcome(outcome: &Arc<Mutex<Result<()>>>) -> Result<()> {
    std::mem::replace(&mut *outcome.lock(), Ok(()))
}

/// Deactivation path: detach the root on the UI thread, run teardown hooks,
/// then drop the component from its perspective.
fn tear_down(component: &Arc<UiComponent>, ctx: &RunnerContext) {
    let detach_result = {
        let component = component.clone();
        let scene = ctx.scene.clone();
        worker::run_on_ui_thread_and_wait(&ctx.dispatcher, move || {
            if let Some(root) = component.root() {
                let _ = scene.set_view_state(root, false);
                let _ = scene.detach(root);
            }
        })
    };
    if let Err(err) = detach_result {
        tracing::warn!(
            target: "easel::runner",
            component = component.context().id(),
            error = %err,
            "failed to detach component root during teardown"
        );
    }

    worker::run_teardown_if_deactivated(component);
    ctx.perspective.unregister(component.context().id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentView, ViewResult};
    use crate::context::Context;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A view that creates its root on first handle and counts invocations.
    struct CountingView {
        scene: SharedSceneGraph,
        handles: Arc<AtomicUsize>,
    }

    impl ComponentView for CountingView {
        fn handle(&mut self, message: &Message) -> ViewResult {
            self.handles.fetch_add(1, Ordering::SeqCst);
            if message.is_init() {
                Ok(Some(self.scene.create_node("view-root")))
            } else {
                Ok(None)
            }
        }
    }

    fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_runner_bootstraps_and_tears_down() {
        let dispatcher = Arc::new(UiDispatcher::new());
        let scene = SharedSceneGraph::new();
        let container = scene.create_node("container");

        let perspective = Arc::new(Perspective::new(Arc::new(Context::new("workspace"))));
        let handles = Arc::new(AtomicUsize::new(0));
        let component = Arc::new(UiComponent::programmatic(
            Arc::new(Context::new("editor")),
            Box::new(CountingView {
                scene: scene.clone(),
                handles: handles.clone(),
            }),
        ));
        component.context().set_execution_target("workspace.main");
        perspective.register(component.clone());

        component
            .base()
            .put_message(Message::init("workbench", "editor"))
            .unwrap();

        let runner = ComponentRunner::spawn(
            component.clone(),
            RunnerContext {
                scene: scene.clone(),
                dispatcher: dispatcher.clone(),
                perspective: perspective.clone(),
                container,
            },
        );

        assert!(wait_until(Duration::from_secs(2), || component
            .base()
            .is_started()));
        let root = component.root().expect("bootstrap must produce a root");
        assert_eq!(scene.parent(root).unwrap(), Some(container));
        assert!(scene.flags(root).unwrap().visible);
        assert_eq!(handles.load(Ordering::SeqCst), 1);

        // Deactivate: the runner tears down and leaves the perspective.
        component.context().set_active(false);
        runner.join().unwrap();

        assert!(!component.base().is_started());
        assert!(perspective.component("editor").is_none());
        assert_eq!(scene.parent(root).unwrap(), None);
        assert!(!scene.flags(root).unwrap().visible);

        dispatcher.shutdown_and_join();
    }

    #[test]
    fn test_runner_exits_on_application_shutdown_without_teardown() {
        let dispatcher = Arc::new(UiDispatcher::new());
        let scene = SharedSceneGraph::new();
        let container = scene.create_node("container");

        let perspective = Arc::new(Perspective::new(Arc::new(Context::new("workspace"))));
        let component = Arc::new(UiComponent::programmatic(
            Arc::new(Context::new("editor")),
            Box::new(CountingView {
                scene: scene.clone(),
                handles: Arc::new(AtomicUsize::new(0)),
            }),
        ));
        perspective.register(component.clone());

        let runner = ComponentRunner::spawn(
            component.clone(),
            RunnerContext {
                scene,
                dispatcher: dispatcher.clone(),
                perspective: perspective.clone(),
                container,
            },
        );

        dispatcher.shutdown();
        runner.join().unwrap();

        // Still active: shutdown is not deactivation, so no teardown ran.
        assert!(component.context().is_active());
        assert!(perspective.component("editor").is_some());

        dispatcher.join();
    }
}
