//! Components: the shared base state and the leaf UI component.
//!
//! [`ComponentBase`] unifies the started flag, locale/resource metadata,
//! identity and the message queue for both leaf components and composite
//! perspectives. [`UiComponent`] adds the view surface: a render mode, the
//! root scene node, and the application-provided [`ComponentView`].

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use easel_core::NodeId;
use parking_lot::Mutex;

use crate::context::Context;
use crate::error::{Result, WorkerError};
use crate::lifecycle::LifecycleHooks;
use crate::message::Message;

/// Global counter identifying message queues, for component equality.
static NEXT_QUEUE_TAG: AtomicU64 = AtomicU64::new(1);

/// How a component obtains its root node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// The root comes from a declarative view definition and must never be
    /// replaced from a post-handle hook.
    Declarative,
    /// The root is produced programmatically by handle/post-handle logic.
    Programmatic,
}

/// Result of a view's handle or post-handle step: an optional root node.
pub type ViewResult = Result<Option<NodeId>>;

/// The application-author surface of a leaf component.
///
/// `handle` runs on a worker thread and must not touch the scene;
/// `post_handle` runs on the UI thread with the handle step's result.
pub trait ComponentView: Send {
    /// Process a message off the UI thread, optionally producing a root node.
    fn handle(&mut self, message: &Message) -> ViewResult;

    /// Post-process the handle result on the UI thread.
    ///
    /// Returning `Ok(None)` keeps the handle result as the effective root.
    /// Programmatic components may return a replacement root; declarative
    /// components must not (see
    /// [`WorkerError::DeclarativeRootReplacement`]).
    fn post_handle(&mut self, handle_result: Option<NodeId>, message: &Message) -> ViewResult {
        let _ = (handle_result, message);
        Ok(None)
    }
}

/// Shared state of every component and perspective.
pub struct ComponentBase {
    started: AtomicBool,
    locale_id: Mutex<String>,
    resource_bundle_location: Mutex<String>,
    context: Arc<Context>,
    queue_sender: Sender<Message>,
    queue_receiver: Receiver<Message>,
    queue_tag: u64,
}

impl ComponentBase {
    /// Create a base owning the given context and a fresh message queue.
    pub fn new(context: Arc<Context>) -> Self {
        let (queue_sender, queue_receiver) = unbounded();
        Self {
            started: AtomicBool::new(false),
            locale_id: Mutex::new(String::new()),
            resource_bundle_location: Mutex::new(String::new()),
            context,
            queue_sender,
            queue_receiver,
            queue_tag: NEXT_QUEUE_TAG.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Whether the component has started.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Set the started flag.
    ///
    /// No side effects beyond the flag; callers are responsible for invoking
    /// lifecycle hooks around the transition.
    pub fn set_started(&self, started: bool) {
        self.started.store(started, Ordering::Release);
    }

    /// Force the started flag off, bypassing the public transition path.
    ///
    /// Reserved for teardown (see
    /// [`crate::worker::run_teardown_if_deactivated`]).
    pub(crate) fn force_stopped(&self) {
        self.started.store(false, Ordering::Release);
    }

    /// The locale id.
    pub fn locale_id(&self) -> String {
        self.locale_id.lock().clone()
    }

    /// Set the locale id.
    pub fn set_locale_id(&self, locale_id: impl Into<String>) {
        *self.locale_id.lock() = locale_id.into();
    }

    /// The resource bundle location.
    pub fn resource_bundle_location(&self) -> String {
        self.resource_bundle_location.lock().clone()
    }

    /// Set the resource bundle location.
    pub fn set_resource_bundle_location(&self, location: impl Into<String>) {
        *self.resource_bundle_location.lock() = location.into();
    }

    /// The owned context.
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// A producer handle on the message queue.
    pub fn sender(&self) -> Sender<Message> {
        self.queue_sender.clone()
    }

    /// The consumer side of the message queue. FIFO, single consumer.
    pub fn receiver(&self) -> &Receiver<Message> {
        &self.queue_receiver
    }

    /// Enqueue a message for this component.
    pub fn put_message(&self, message: Message) -> Result<()> {
        self.queue_sender
            .send(message)
            .map_err(|_| WorkerError::QueueClosed)
    }
}

impl PartialEq for ComponentBase {
    fn eq(&self, other: &Self) -> bool {
        self.is_started() == other.is_started()
            && *self.locale_id.lock() == *other.locale_id.lock()
            && *self.resource_bundle_location.lock() == *other.resource_bundle_location.lock()
            && *self.context == *other.context
            && self.queue_tag == other.queue_tag
    }
}

impl Eq for ComponentBase {}

impl PartialOrd for ComponentBase {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComponentBase {
    /// Total order by context id, used to order components in a perspective's
    /// managed list.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.context.id().cmp(other.context.id())
    }
}

impl fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBase")
            .field("id", &self.context.id())
            .field("started", &self.is_started())
            .field("locale_id", &*self.locale_id.lock())
            .finish()
    }
}

/// A leaf UI component: base state plus its view surface.
///
/// Shared as `Arc<UiComponent>` between the perspective that owns it, the
/// runner draining its queue, and the routing utilities.
pub struct UiComponent {
    base: ComponentBase,
    render_mode: RenderMode,
    root: Mutex<Option<NodeId>>,
    /// Id of the perspective currently hosting this component. Stays stale
    /// after a target change until the perspective drains its hand-off queue;
    /// see [`crate::perspective::Perspective::process_handoff`].
    parent_id: Mutex<String>,
    view: Mutex<Box<dyn ComponentView>>,
    hooks: LifecycleHooks,
}

impl UiComponent {
    /// Create a programmatic component. The root is produced later by the
    /// view's handle logic.
    pub fn programmatic(context: Arc<Context>, view: Box<dyn ComponentView>) -> Self {
        Self::new(context, RenderMode::Programmatic, None, view)
    }

    /// Create a declarative component whose root was supplied by the view
    /// loader.
    pub fn declarative(
        context: Arc<Context>,
        root: NodeId,
        view: Box<dyn ComponentView>,
    ) -> Self {
        Self::new(context, RenderMode::Declarative, Some(root), view)
    }

    fn new(
        context: Arc<Context>,
        render_mode: RenderMode,
        root: Option<NodeId>,
        view: Box<dyn ComponentView>,
    ) -> Self {
        Self {
            base: ComponentBase::new(context),
            render_mode,
            root: Mutex::new(root),
            parent_id: Mutex::new(String::new()),
            view: Mutex::new(view),
            hooks: LifecycleHooks::new(),
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

    /// How this component obtains its root node.
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// The current root node, if any.
    pub fn root(&self) -> Option<NodeId> {
        *self.root.lock()
    }

    /// Replace the root node.
    pub fn set_root(&self, root: Option<NodeId>) {
        *self.root.lock() = root;
    }

    /// The id of the perspective currently recorded as hosting this
    /// component. May lag the declared execution target until the hand-off
    /// queue is drained.
    pub fn parent_id(&self) -> String {
        self.parent_id.lock().clone()
    }

    /// Record the hosting perspective. Written by the perspective's hand-off
    /// drain, not by the routing utilities.
    pub fn set_parent_id(&self, parent_id: impl Into<String>) {
        *self.parent_id.lock() = parent_id.into();
    }

    /// The lifecycle hook registry.
    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }

    /// Run the view's handle logic. Called on a worker thread; errors
    /// propagate to the caller.
    pub fn run_handle(&self, message: &Message) -> ViewResult {
        self.view.lock().handle(message)
    }

    /// Run the view's post-handle logic. Must be called on the UI thread.
    pub fn run_post_handle(&self, handle_result: Option<NodeId>, message: &Message) -> ViewResult {
        self.view.lock().post_handle(handle_result, message)
    }
}

impl fmt::Debug for UiComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiComponent")
            .field("id", &self.context().id())
            .field("render_mode", &self.render_mode)
            .field("started", &self.base.is_started())
            .field("parent_id", &*self.parent_id.lock())
            .finish()
    }
}
