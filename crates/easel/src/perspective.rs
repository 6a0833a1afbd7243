//! Perspectives: composite components owning an ordered set of UI components.
//!
//! A perspective manages its components' containers and is the single
//! consumer of its hand-off queue: when routing decides a component belongs
//! under a different target, the component is enqueued and the perspective
//! re-parents it from its own processing, so re-parenting never races with
//! the enqueueing worker.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use easel_core::{NodeId, SharedSceneGraph, debug_assert_ui_thread};
use parking_lot::{Mutex, RwLock};

use crate::component::{ComponentBase, UiComponent};
use crate::context::Context;
use crate::error::Result;
use crate::worker;

/// A composite component hosting leaf components.
///
/// Components are unique by context id; insertion order is preserved for
/// display. Every component in the active set has an active context — the
/// perspective removes a component only after its teardown has completed.
pub struct Perspective {
    base: ComponentBase,
    components: Mutex<Vec<Arc<UiComponent>>>,
    /// Named container nodes components can be mounted into.
    containers: RwLock<HashMap<String, NodeId>>,
    handoff_sender: Sender<Arc<UiComponent>>,
    handoff_receiver: Receiver<Arc<UiComponent>>,
}

impl Perspective {
    /// Create a perspective owning the given context.
    pub fn new(context: Arc<Context>) -> Self {
        let (handoff_sender, handoff_receiver) = unbounded();
        Self {
            base: ComponentBase::new(context),
            components: Mutex::new(Vec::new()),
            containers: RwLock::new(HashMap::new()),
            handoff_sender,
            handoff_receiver,
        }
    }

    /// The shared base state.
    pub fn base(&self) -> &ComponentBase {
        &self.base
    }

    /// Shortcut for the owned context.
    pub fn context(&self) -> &Arc<Context> {
        self.base.context()
    }

    /// Register a named container node.
    pub fn register_container(&self, name: impl Into<String>, node: NodeId) {
        self.containers.write().insert(name.into(), node);
    }

    /// Resolve a named container node.
    pub fn container(&self, name: &str) -> Option<NodeId> {
        self.containers.read().get(name).copied()
    }

    /// Add a component to the managed set, recording this perspective as its
    /// parent. A component with the same context id replaces the existing
    /// entry in place; repeated registration never accumulates duplicates.
    pub fn register(&self, component: Arc<UiComponent>) {
        component.set_parent_id(self.context().id());
        let mut components = self.components.lock();
        if let Some(existing) = components
            .iter_mut()
            .find(|c| c.context().id() == component.context().id())
        {
            *existing = component;
        } else {
            components.push(component);
        }
    }

    /// Remove a component from the managed set by context id.
    ///
    /// Callers invoke this only after the component's teardown has completed.
    pub fn unregister(&self, id: &str) -> Option<Arc<UiComponent>> {
        let mut components = self.components.lock();
        let position = components.iter().position(|c| c.context().id() == id)?;
        Some(components.remove(position))
    }

    /// Snapshot of the managed components in insertion order.
    pub fn components(&self) -> Vec<Arc<UiComponent>> {
        self.components.lock().clone()
    }

    /// Look up a managed component by context id.
    pub fn component(&self, id: &str) -> Option<Arc<UiComponent>> {
        self.components
            .lock()
            .iter()
            .find(|c| c.context().id() == id)
            .cloned()
    }

    /// A producer handle on the hand-off queue, given to routing utilities
    /// (see [`worker::relocate_if_target_changed`]).
    pub fn handoff_sender(&self) -> Sender<Arc<UiComponent>> {
        self.handoff_sender.clone()
    }

    /// Drain the hand-off queue, re-parenting each queued component under the
    /// container its execution target names.
    ///
    /// Single consumer: only this perspective drains its queue, and it does so
    /// on the UI thread. The component's recorded `parent_id` is updated here
    /// and nowhere else, after the scene mutation succeeded.
    ///
    /// Returns the number of components moved.
    pub fn process_handoff(&self, scene: &SharedSceneGraph) -> usize {
        debug_assert_ui_thread!();
        let mut moved = 0;
        while let Ok(component) = self.handoff_receiver.try_recv() {
            match self.reparent(scene, &component) {
                Ok(true) => moved += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        target: "easel::perspective",
                        perspective = self.context().id(),
                        component = component.context().id(),
                        error = %err,
                        "failed to re-parent component"
                    );
                }
            }
        }
        moved
    }

    fn reparent(&self, scene: &SharedSceneGraph, component: &Arc<UiComponent>) -> Result<bool> {
        let target = component.context().execution_target();
        let parent_id = worker::target_parent_id(&target).to_string();
        let container_name = worker::target_container_id(&target).unwrap_or(&target);

        let Some(container) = self.container(container_name) else {
            tracing::warn!(
                target: "easel::perspective",
                component = component.context().id(),
                container = container_name,
                "no container registered for execution target"
            );
            return Ok(false);
        };

        if let Some(root) = component.root() {
            scene.attach(container, root)?;
            scene.set_view_state(root, true)?;
            scene.set_view_state(container, true)?;
        }
        component.set_parent_id(parent_id.clone());
        tracing::debug!(
            target: "easel::perspective",
            component = component.context().id(),
            parent = %parent_id,
            container = container_name,
            "re-parented component"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentView, ViewResult};
    use crate::message::Message;

    struct NullView;

    impl ComponentView for NullView {
        fn handle(&mut self, _message: &Message) -> ViewResult {
            Ok(None)
        }
    }

    fn component(id: &str) -> Arc<UiComponent> {
        Arc::new(UiComponent::programmatic(
            Arc::new(Context::new(id)),
            Box::new(NullView),
        ))
    }

    fn perspective(id: &str) -> Perspective {
        Perspective::new(Arc::new(Context::new(id)))
    }

    #[test]
    fn test_register_records_parent_and_deduplicates() {
        let perspective = perspective("workspace");
        let first = component("editor");
        let second = component("editor");

        perspective.register(first);
        perspective.register(second.clone());

        let components = perspective.components();
        assert_eq!(components.len(), 1);
        assert!(Arc::ptr_eq(&components[0], &second));
        assert_eq!(second.parent_id(), "workspace");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let perspective = perspective("workspace");
        for id in ["charlie", "alpha", "bravo"] {
            perspective.register(component(id));
        }

        let ids: Vec<String> = perspective
            .components()
            .iter()
            .map(|c| c.context().id().to_string())
            .collect();
        assert_eq!(ids, vec!["charlie", "alpha", "bravo"]);
    }

    #[test]
    fn test_unregister() {
        let perspective = perspective("workspace");
        perspective.register(component("editor"));

        assert!(perspective.unregister("editor").is_some());
        assert!(perspective.unregister("editor").is_none());
        assert!(perspective.components().is_empty());
    }

    #[test]
    fn test_process_handoff_reparents_and_updates_parent_id() {
        let scene = SharedSceneGraph::new();
        let old_container = scene.create_node("old");
        let new_container = scene.create_node("left");
        let root = scene.create_node("editor-root");
        scene.attach(old_container, root).unwrap();

        let perspective = perspective("sidebar");
        perspective.register_container("left", new_container);

        let editor = component("editor");
        editor.set_root(Some(root));
        editor.set_parent_id("workspace");
        editor.context().set_execution_target("sidebar.left");

        let handoff = perspective.handoff_sender();
        assert!(worker::relocate_if_target_changed(&handoff, &editor));
        // Stale until the perspective drains its queue.
        assert_eq!(editor.parent_id(), "workspace");

        assert_eq!(perspective.process_handoff(&scene), 1);
        assert_eq!(editor.parent_id(), "sidebar");
        assert_eq!(scene.parent(root).unwrap(), Some(new_container));
        assert!(scene.children(old_container).unwrap().is_empty());
        assert!(scene.flags(root).unwrap().visible);
    }

    #[test]
    fn test_process_handoff_without_container_leaves_component() {
        let scene = SharedSceneGraph::new();
        let root = scene.create_node("editor-root");

        let perspective = perspective("sidebar");
        let editor = component("editor");
        editor.set_root(Some(root));
        editor.set_parent_id("workspace");
        editor.context().set_execution_target("sidebar.unknown");

        perspective.handoff_sender().send(editor.clone()).unwrap();
        perspective.process_handoff(&scene);

        // Unresolvable target: node not moved, parent id untouched.
        assert_eq!(editor.parent_id(), "workspace");
        assert_eq!(scene.parent(root).unwrap(), None);
    }
}
