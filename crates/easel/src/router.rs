//! The default action listener: a registry of component message queues.

use std::collections::HashMap;

use crossbeam_channel::Sender;
use parking_lot::RwLock;

use crate::context::ActionListener;
use crate::message::Message;

/// Routes messages to registered component queues by target id.
///
/// Messages addressed to unknown targets are dropped with a warning;
/// delivery is fire-and-forget, FIFO per target queue.
#[derive(Default)]
pub struct MessageRouter {
    routes: RwLock<HashMap<String, Sender<Message>>>,
}

impl MessageRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component's queue under its id, replacing any previous
    /// registration.
    pub fn register(&self, id: impl Into<String>, sender: Sender<Message>) {
        self.routes.write().insert(id.into(), sender);
    }

    /// Remove a component's registration.
    pub fn unregister(&self, id: &str) {
        self.routes.write().remove(id);
    }

    /// Whether a target id is currently routable.
    pub fn knows(&self, id: &str) -> bool {
        self.routes.read().contains_key(id)
    }
}

impl ActionListener for MessageRouter {
    fn notify_components(&self, message: Message) {
        let sender = self.routes.read().get(message.target()).cloned();
        match sender {
            Some(sender) => {
                if sender.send(message).is_err() {
                    tracing::warn!(
                        target: "easel::router",
                        "dropping message for closed target queue"
                    );
                }
            }
            None => {
                tracing::warn!(
                    target: "easel::router",
                    target_id = message.target(),
                    "dropping message for unknown target"
                );
            }
        }
    }
}
