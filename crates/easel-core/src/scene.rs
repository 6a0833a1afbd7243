//! The scene graph: the container tree the framework mutates.
//!
//! Nodes model the external widget tree's attachment points. The core does not
//! render anything; it only maintains parent/child links and the three
//! view-state flags (`visible`, `disabled`, `managed`) that lifecycle
//! operations toggle. All mutation is expected to happen on the UI thread;
//! callers marshal through the dispatcher bridge.

use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};
use std::sync::Arc;

use crate::error::{CoreError, Result};

new_key_type! {
    /// A unique, stable identifier for a node in the scene graph.
    ///
    /// `NodeId`s remain valid as the tree changes and become invalid when the
    /// node is removed.
    pub struct NodeId;
}

/// The three view-state flags of a node.
///
/// The framework keeps them in lockstep through
/// [`SceneGraph::set_view_state`]: a node is never "visible but disabled from
/// layout" or any other mixed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewFlags {
    /// Whether the node is visible.
    pub visible: bool,
    /// Whether the node is disabled for input.
    pub disabled: bool,
    /// Whether the node participates in layout.
    pub managed: bool,
}

impl Default for ViewFlags {
    fn default() -> Self {
        // Toolkit defaults for a freshly created node.
        Self {
            visible: true,
            disabled: false,
            managed: true,
        }
    }
}

struct NodeData {
    /// Human-readable name for debugging and lookup.
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    flags: ViewFlags,
}

/// Arena of scene nodes with parent/child links and view-state flags.
pub struct SceneGraph {
    nodes: SlotMap<NodeId, NodeData>,
}

impl SceneGraph {
    /// Create an empty scene graph.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Create a new detached node with default flags.
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = self.nodes.insert(NodeData {
            name: name.clone(),
            parent: None,
            children: Vec::new(),
            flags: ViewFlags::default(),
        });
        tracing::trace!(target: "easel_core::scene", ?id, name = %name, "created node");
        id
    }

    /// Remove a node and all its descendants.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let descendants = self.collect_descendants(id)?;
        if let Some(data) = self.nodes.get(id)
            && let Some(parent_id) = data.parent
            && let Some(parent_data) = self.nodes.get_mut(parent_id)
        {
            parent_data.children.retain(|&child| child != id);
        }
        for child in descendants {
            self.nodes.remove(child);
        }
        self.nodes.remove(id);
        Ok(())
    }

    fn collect_descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        self.collect_descendants_recursive(id, &mut result)?;
        Ok(result)
    }

    fn collect_descendants_recursive(&self, id: NodeId, result: &mut Vec<NodeId>) -> Result<()> {
        let data = self.nodes.get(id).ok_or(CoreError::InvalidNode)?;
        for &child in &data.children {
            self.collect_descendants_recursive(child, result)?;
            result.push(child);
        }
        Ok(())
    }

    /// Check if a node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get a node's parent.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.nodes
            .get(id)
            .map(|data| data.parent)
            .ok_or(CoreError::InvalidNode)
    }

    /// Get a node's children in attachment order.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.nodes
            .get(id)
            .map(|data| data.children.clone())
            .ok_or(CoreError::InvalidNode)
    }

    /// Get a node's debug name.
    pub fn name(&self, id: NodeId) -> Result<String> {
        self.nodes
            .get(id)
            .map(|data| data.name.clone())
            .ok_or(CoreError::InvalidNode)
    }

    /// Attach `child` as the last child of `parent`, detaching it from any
    /// previous parent.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return Err(CoreError::InvalidNode);
        }
        // Reject cycles: parent must not be the child or one of its descendants.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(CoreError::CircularAttachment);
            }
            cursor = self.nodes.get(id).and_then(|data| data.parent);
        }

        self.detach(child)?;
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        tracing::trace!(target: "easel_core::scene", ?parent, ?child, "attached node");
        Ok(())
    }

    /// Detach a node from its parent, leaving it a root.
    pub fn detach(&mut self, child: NodeId) -> Result<()> {
        let old_parent = self
            .nodes
            .get(child)
            .ok_or(CoreError::InvalidNode)?
            .parent;
        if let Some(parent) = old_parent {
            if let Some(parent_data) = self.nodes.get_mut(parent) {
                parent_data.children.retain(|&c| c != child);
            }
            self.nodes[child].parent = None;
        }
        Ok(())
    }

    /// Get a node's view-state flags.
    pub fn flags(&self, id: NodeId) -> Result<ViewFlags> {
        self.nodes
            .get(id)
            .map(|data| data.flags)
            .ok_or(CoreError::InvalidNode)
    }

    /// Set a node's visibility.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.nodes
            .get_mut(id)
            .map(|data| data.flags.visible = visible)
            .ok_or(CoreError::InvalidNode)
    }

    /// Set a node's disabled flag.
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<()> {
        self.nodes
            .get_mut(id)
            .map(|data| data.flags.disabled = disabled)
            .ok_or(CoreError::InvalidNode)
    }

    /// Set a node's managed flag.
    pub fn set_managed(&mut self, id: NodeId, managed: bool) -> Result<()> {
        self.nodes
            .get_mut(id)
            .map(|data| data.flags.managed = managed)
            .ok_or(CoreError::InvalidNode)
    }

    /// Set visibility, input and layout participation together.
    ///
    /// `active == true` means visible, not disabled, managed; `active == false`
    /// the exact reverse. The three flags never diverge through this path.
    pub fn set_view_state(&mut self, id: NodeId, active: bool) -> Result<()> {
        let data = self.nodes.get_mut(id).ok_or(CoreError::InvalidNode)?;
        data.flags = ViewFlags {
            visible: active,
            disabled: !active,
            managed: active,
        };
        Ok(())
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// A cloneable, thread-safe handle to a [`SceneGraph`].
///
/// Reads may come from any thread; mutation is expected on the UI thread.
#[derive(Clone)]
pub struct SharedSceneGraph {
    inner: Arc<RwLock<SceneGraph>>,
}

impl SharedSceneGraph {
    /// Create an empty shared scene graph.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SceneGraph::new())),
        }
    }

    /// See [`SceneGraph::create_node`].
    pub fn create_node(&self, name: impl Into<String>) -> NodeId {
        self.inner.write().create_node(name)
    }

    /// See [`SceneGraph::remove_node`].
    pub fn remove_node(&self, id: NodeId) -> Result<()> {
        self.inner.write().remove_node(id)
    }

    /// See [`SceneGraph::contains`].
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.read().contains(id)
    }

    /// See [`SceneGraph::parent`].
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.inner.read().parent(id)
    }

    /// See [`SceneGraph::children`].
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.inner.read().children(id)
    }

    /// See [`SceneGraph::name`].
    pub fn name(&self, id: NodeId) -> Result<String> {
        self.inner.read().name(id)
    }

    /// See [`SceneGraph::attach`].
    pub fn attach(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.inner.write().attach(parent, child)
    }

    /// See [`SceneGraph::detach`].
    pub fn detach(&self, child: NodeId) -> Result<()> {
        self.inner.write().detach(child)
    }

    /// See [`SceneGraph::flags`].
    pub fn flags(&self, id: NodeId) -> Result<ViewFlags> {
        self.inner.read().flags(id)
    }

    /// See [`SceneGraph::set_visible`].
    pub fn set_visible(&self, id: NodeId, visible: bool) -> Result<()> {
        self.inner.write().set_visible(id, visible)
    }

    /// See [`SceneGraph::set_disabled`].
    pub fn set_disabled(&self, id: NodeId, disabled: bool) -> Result<()> {
        self.inner.write().set_disabled(id, disabled)
    }

    /// See [`SceneGraph::set_managed`].
    pub fn set_managed(&self, id: NodeId, managed: bool) -> Result<()> {
        self.inner.write().set_managed(id, managed)
    }

    /// See [`SceneGraph::set_view_state`].
    pub fn set_view_state(&self, id: NodeId, active: bool) -> Result<()> {
        self.inner.write().set_view_state(id, active)
    }
}

impl Default for SharedSceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
