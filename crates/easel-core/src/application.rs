//! The global application: dispatcher, scene graph, running state.

use std::sync::OnceLock;

use crate::dispatcher::{DispatcherConfig, UiDispatcher};
use crate::error::{CoreError, Result};
use crate::scene::SharedSceneGraph;
use crate::thread_affinity;

/// Global application instance.
static APPLICATION: OnceLock<Application> = OnceLock::new();

/// The application singleton: owns the UI dispatcher and the scene graph.
///
/// Only one `Application` can exist per process. Embedders that need several
/// independent UI threads (tests above all) construct [`UiDispatcher`]
/// directly instead.
///
/// # Example
///
/// ```no_run
/// use easel_core::Application;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let app = Application::init()?;
///     app.run_and_wait(|| {
///         // mutate the scene on the UI thread
///     })?;
///     app.shutdown();
///     Ok(())
/// }
/// ```
pub struct Application {
    dispatcher: UiDispatcher,
    scene: SharedSceneGraph,
}

impl Application {
    /// Initialize the global application.
    ///
    /// Starts the UI dispatcher thread and registers it as the UI thread.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyInitialized`] if an application already
    /// exists in this process.
    pub fn init() -> Result<&'static Application> {
        Self::init_with_config(DispatcherConfig::default())
    }

    /// Initialize the global application with a custom dispatcher configuration.
    pub fn init_with_config(config: DispatcherConfig) -> Result<&'static Application> {
        let app = Application {
            dispatcher: UiDispatcher::with_config(config),
            scene: SharedSceneGraph::new(),
        };

        APPLICATION
            .set(app)
            .map_err(|_| CoreError::AlreadyInitialized)?;
        let app = APPLICATION.get().unwrap();

        // Register the dispatcher thread as the UI thread for affinity checks.
        app.dispatcher.run_and_wait(thread_affinity::set_ui_thread)?;

        tracing::info!(target: "easel_core::application", "application initialized");
        Ok(app)
    }

    /// Get the global application instance.
    ///
    /// # Panics
    ///
    /// Panics if [`Application::init`] has not been called yet.
    pub fn instance() -> &'static Application {
        APPLICATION
            .get()
            .expect("Application not initialized. Call Application::init() first.")
    }

    /// Try to get the global application instance.
    pub fn try_instance() -> Option<&'static Application> {
        APPLICATION.get()
    }

    /// The UI dispatcher.
    pub fn dispatcher(&self) -> &UiDispatcher {
        &self.dispatcher
    }

    /// The scene graph.
    pub fn scene(&self) -> &SharedSceneGraph {
        &self.scene
    }

    /// Schedule a task on the UI thread without waiting. See
    /// [`UiDispatcher::run_later`].
    pub fn run_later<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatcher.run_later(task)
    }

    /// Run a task on the UI thread and wait for it. See
    /// [`UiDispatcher::run_and_wait`].
    pub fn run_and_wait<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatcher.run_and_wait(task)
    }

    /// Whether the application is still running.
    pub fn is_running(&self) -> bool {
        self.dispatcher.is_running()
    }

    /// Initiate application shutdown. See [`UiDispatcher::shutdown`].
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }
}
