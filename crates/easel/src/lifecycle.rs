//! Lifecycle hook registry.
//!
//! Hooks are registered explicitly per component and invoked by the framework
//! at the matching lifecycle phase: `PostCreate` after the first successful
//! activation, `PreDestroy` during teardown. Within a phase, hooks run in
//! registration order.

use parking_lot::Mutex;

/// The lifecycle phases a hook can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// After the component has started for the first time.
    PostCreate,
    /// Before the component is destroyed during teardown.
    PreDestroy,
}

type Hook = Box<dyn FnMut() + Send>;

/// An ordered set of callables per lifecycle phase.
#[derive(Default)]
pub struct LifecycleHooks {
    post_create: Mutex<Vec<Hook>>,
    pre_destroy: Mutex<Vec<Hook>>,
}

impl LifecycleHooks {
    /// Create an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for the post-create phase.
    pub fn on_post_create<F>(&self, hook: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.post_create.lock().push(Box::new(hook));
    }

    /// Register a hook for the pre-destroy phase.
    pub fn on_pre_destroy<F>(&self, hook: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.pre_destroy.lock().push(Box::new(hook));
    }

    /// Invoke all hooks of a phase in registration order.
    ///
    /// Returns the number of hooks invoked.
    pub fn run(&self, phase: LifecyclePhase) -> usize {
        let mut hooks = match phase {
            LifecyclePhase::PostCreate => self.post_create.lock(),
            LifecyclePhase::PreDestroy => self.pre_destroy.lock(),
        };
        for hook in hooks.iter_mut() {
            hook();
        }
        hooks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_hooks_run_in_registration_order() {
        let hooks = LifecycleHooks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order_clone = order.clone();
            hooks.on_pre_destroy(move || order_clone.lock().push(i));
        }

        assert_eq!(hooks.run(LifecyclePhase::PreDestroy), 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_phases_are_independent() {
        let hooks = LifecycleHooks::new();
        hooks.on_post_create(|| {});

        assert_eq!(hooks.run(LifecyclePhase::PreDestroy), 0);
        assert_eq!(hooks.run(LifecyclePhase::PostCreate), 1);
    }
}
