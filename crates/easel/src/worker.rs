//! Worker coordination utilities.
//!
//! Free functions shared by all component workers: bridging work onto the UI
//! thread, mounting and relocating component roots, delegating handle return
//! values, and teardown. The runner (see [`crate::runner`]) strings these
//! together per message; they are also usable individually by embedders.

use std::sync::Arc;

use crossbeam_channel::Sender;
use easel_core::{NodeId, SharedSceneGraph, UiDispatcher, debug_assert_ui_thread};

use crate::component::{RenderMode, UiComponent};
use crate::context::Context;
use crate::error::{Result, WorkerError};
use crate::lifecycle::LifecyclePhase;
use crate::message::{Message, Value};

/// Run `work` on the UI thread and block until it has executed.
///
/// Skipped silently when shutdown has begun; a panic inside `work` is
/// captured and re-raised here as [`WorkerError::Execution`].
pub fn run_on_ui_thread_and_wait<F>(dispatcher: &UiDispatcher, work: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    dispatcher.run_and_wait(work).map_err(WorkerError::from)
}

/// If the component's context has been deactivated, force its started flag
/// off and run its pre-destroy hooks. No-op while the context is active.
///
/// Returns `true` if teardown ran.
pub fn run_teardown_if_deactivated(component: &UiComponent) -> bool {
    if component.context().is_active() {
        return false;
    }
    component.base().force_stopped();
    let invoked = component.hooks().run(LifecyclePhase::PreDestroy);
    tracing::debug!(
        target: "easel::worker",
        component = component.context().id(),
        hooks = invoked,
        "component torn down"
    );
    true
}

/// Append the component's root to `container` and mark both active.
///
/// Must run on the UI thread.
pub fn add_component_to_container(
    scene: &SharedSceneGraph,
    container: NodeId,
    component: &UiComponent,
) -> Result<()> {
    debug_assert_ui_thread!();
    if let Some(root) = component.root() {
        scene.set_view_state(root, true)?;
        scene.attach(container, root)?;
    }
    scene.set_view_state(container, true)?;
    Ok(())
}

/// Set visibility, input and layout participation together. See
/// [`SharedSceneGraph::set_view_state`].
pub fn set_view_state(scene: &SharedSceneGraph, node: NodeId, active: bool) -> Result<()> {
    debug_assert_ui_thread!();
    scene.set_view_state(node, active)?;
    Ok(())
}

/// Forward a handle return value as a new message to `target`.
///
/// Nothing is forwarded unless both a value and a target are present; the
/// reserved "init" kind never delegates, so bootstrap handling cannot trigger
/// spurious follow-up messages. The outbound message carries this component's
/// context id as its source and an empty kind.
pub fn delegate_return_value(
    component: &UiComponent,
    target: Option<&str>,
    value: Option<Value>,
    message: &Message,
) -> Result<()> {
    let (Some(target), Some(value)) = (target, value) else {
        return Ok(());
    };
    if message.is_init() {
        return Ok(());
    }
    let context: &Arc<Context> = component.context();
    let listener = context
        .action_listener()
        .ok_or(WorkerError::ListenerUnavailable)?;
    listener.notify_components(Message::new(context.id(), target, Some(value), ""));
    Ok(())
}

/// Execute the component's post-handle hook with the handle step's result.
///
/// Must run on the UI thread. A `None` hook result keeps the original handle
/// result as the effective root. A `Some` result from a declarative component
/// is a fatal usage error; from a programmatic component it becomes the new
/// root and is made visible.
pub fn execute_post_handle(
    scene: &SharedSceneGraph,
    component: &UiComponent,
    handle_result: Option<NodeId>,
    message: &Message,
) -> Result<()> {
    debug_assert_ui_thread!();
    let mut effective = component.run_post_handle(handle_result, message)?;
    if effective.is_none() {
        effective = handle_result;
    } else if component.render_mode() == RenderMode::Declarative {
        return Err(WorkerError::DeclarativeRootReplacement);
    }
    if let Some(node) = effective
        && component.render_mode() == RenderMode::Programmatic
    {
        scene.set_visible(node, true)?;
        component.set_root(Some(node));
    }
    Ok(())
}

/// Enqueue the component for re-parenting if its declared execution target
/// resolves to a different perspective than the one currently recorded.
///
/// The component's own `parent_id` is left untouched; the observing
/// perspective updates it when it drains the hand-off queue. Returns `true`
/// if the component was enqueued.
pub fn relocate_if_target_changed(
    handoff: &Sender<Arc<UiComponent>>,
    component: &Arc<UiComponent>,
) -> bool {
    let target = component.context().execution_target();
    let new_parent = target_parent_id(&target);
    if component.parent_id() == new_parent {
        return false;
    }
    tracing::debug!(
        target: "easel::worker",
        component = component.context().id(),
        from = %component.parent_id(),
        to = %new_parent,
        "component target changed, delegating to perspective"
    );
    handoff.send(component.clone()).is_ok()
}

/// Run the component's handle logic with the triggering message.
///
/// Called on a worker thread; errors propagate to the caller uncaught.
pub fn run_handle(component: &UiComponent, message: &Message) -> Result<Option<NodeId>> {
    component.run_handle(message)
}

/// The perspective part of an execution target `"perspectiveId.containerId"`.
///
/// A target without a separator names the perspective itself.
pub fn target_parent_id(execution_target: &str) -> &str {
    execution_target
        .split('.')
        .next()
        .unwrap_or(execution_target)
}

/// The container part of an execution target, if present.
pub fn target_container_id(execution_target: &str) -> Option<&str> {
    execution_target.split('.').nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentView, ViewResult};
    use crate::router::MessageRouter;
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;

    struct NullView;

    impl ComponentView for NullView {
        fn handle(&mut self, _message: &Message) -> ViewResult {
            Ok(None)
        }
    }

    /// A view whose post-handle result is scripted.
    struct ScriptedView {
        post_result: Option<NodeId>,
    }

    impl ComponentView for ScriptedView {
        fn handle(&mut self, _message: &Message) -> ViewResult {
            Ok(None)
        }

        fn post_handle(&mut self, _handle_result: Option<NodeId>, _message: &Message) -> ViewResult {
            Ok(self.post_result)
        }
    }

    fn programmatic(id: &str) -> Arc<UiComponent> {
        Arc::new(UiComponent::programmatic(
            Arc::new(Context::new(id)),
            Box::new(NullView),
        ))
    }

    #[test]
    fn test_teardown_noop_while_active() {
        let component = programmatic("editor");
        component.base().set_started(true);

        assert!(!run_teardown_if_deactivated(&component));
        assert!(component.base().is_started());
    }

    #[test]
    fn test_teardown_forces_stop_and_runs_hooks_once() {
        let component = programmatic("editor");
        component.base().set_started(true);

        let invocations = Arc::new(Mutex::new(0));
        let invocations_clone = invocations.clone();
        component
            .hooks()
            .on_pre_destroy(move || *invocations_clone.lock() += 1);

        component.context().set_active(false);
        assert!(run_teardown_if_deactivated(&component));
        assert!(!component.base().is_started());
        assert_eq!(*invocations.lock(), 1);
    }

    #[test]
    fn test_delegation_table() {
        // (value present, target present, kind, expect forward)
        let cases: Vec<(bool, bool, &str, bool)> = vec![
            (true, true, "update", true),
            (true, true, Message::INIT, false),
            (true, false, "update", false),
            (false, true, "update", false),
            (false, false, Message::INIT, false),
        ];

        for (has_value, has_target, kind, expect_forward) in cases {
            let component = programmatic("editor");
            let router = Arc::new(MessageRouter::new());
            component
                .context()
                .set_action_listener(router.clone());

            let (sink_tx, sink_rx) = unbounded();
            router.register("console", sink_tx);

            let message = Message::new("workbench", "editor", None, kind);
            let value: Option<Value> = has_value.then(|| Arc::new(1_i32) as Value);
            let target = has_target.then_some("console");

            delegate_return_value(&component, target, value, &message).unwrap();

            let forwarded = sink_rx.try_recv();
            assert_eq!(
                forwarded.is_ok(),
                expect_forward,
                "case (value={has_value}, target={has_target}, kind={kind})"
            );
            if let Ok(forwarded) = forwarded {
                assert_eq!(forwarded.source(), "editor");
                assert_eq!(forwarded.target(), "console");
                assert!(!forwarded.is_init());
            }
        }
    }

    #[test]
    fn test_post_handle_keeps_handle_result_when_hook_returns_none() {
        let scene = SharedSceneGraph::new();
        let node = scene.create_node("produced");
        let component = programmatic("editor");

        let message = Message::new("w", "editor", None, "update");
        execute_post_handle(&scene, &component, Some(node), &message).unwrap();

        assert_eq!(component.root(), Some(node));
        assert!(scene.flags(node).unwrap().visible);
    }

    #[test]
    fn test_post_handle_replacement_updates_programmatic_root() {
        let scene = SharedSceneGraph::new();
        let original = scene.create_node("original");
        let replacement = scene.create_node("replacement");

        let component = Arc::new(UiComponent::programmatic(
            Arc::new(Context::new("editor")),
            Box::new(ScriptedView {
                post_result: Some(replacement),
            }),
        ));
        component.set_root(Some(original));

        let message = Message::new("w", "editor", None, "update");
        execute_post_handle(&scene, &component, Some(original), &message).unwrap();

        assert_eq!(component.root(), Some(replacement));
        assert!(scene.flags(replacement).unwrap().visible);
    }

    #[test]
    fn test_post_handle_replacement_is_fatal_for_declarative() {
        let scene = SharedSceneGraph::new();
        let markup_root = scene.create_node("markup-root");
        let replacement = scene.create_node("replacement");

        let component = Arc::new(UiComponent::declarative(
            Arc::new(Context::new("editor")),
            markup_root,
            Box::new(ScriptedView {
                post_result: Some(replacement),
            }),
        ));

        let message = Message::new("w", "editor", None, "update");
        let result = execute_post_handle(&scene, &component, None, &message);
        assert!(matches!(
            result,
            Err(WorkerError::DeclarativeRootReplacement)
        ));
        // The markup root is untouched.
        assert_eq!(component.root(), Some(markup_root));
    }

    #[test]
    fn test_relocate_only_when_parent_differs() {
        let (handoff_tx, handoff_rx) = unbounded();
        let component = programmatic("editor");
        component.set_parent_id("workspace");

        component.context().set_execution_target("workspace.left");
        assert!(!relocate_if_target_changed(&handoff_tx, &component));
        assert!(handoff_rx.try_recv().is_err());

        component.context().set_execution_target("sidebar.top");
        assert!(relocate_if_target_changed(&handoff_tx, &component));
        let queued = handoff_rx.try_recv().unwrap();
        assert_eq!(queued.context().id(), "editor");
        // parent_id stays stale until the perspective drains the queue.
        assert_eq!(component.parent_id(), "workspace");
    }

    #[test]
    fn test_target_id_parsing() {
        assert_eq!(target_parent_id("workspace.left"), "workspace");
        assert_eq!(target_parent_id("workspace"), "workspace");
        assert_eq!(target_container_id("workspace.left"), Some("left"));
        assert_eq!(target_container_id("workspace"), None);
    }

    #[test]
    fn test_add_component_to_container() {
        let scene = SharedSceneGraph::new();
        let container = scene.create_node("container");
        scene.set_view_state(container, false).unwrap();
        let root = scene.create_node("root");

        let component = programmatic("editor");
        component.set_root(Some(root));

        add_component_to_container(&scene, container, &component).unwrap();

        assert_eq!(scene.parent(root).unwrap(), Some(container));
        assert!(scene.flags(root).unwrap().visible);
        assert!(scene.flags(container).unwrap().visible);
        assert!(!scene.flags(container).unwrap().disabled);
    }
}
