//! Application container.
//!
//! Owns the context, the logger and the lifecycle driver, and holds a handle
//! to the plugin registry. `start()` and `unmount()` are the only externally
//! driven entry points.
//!
//! Phase gating follows the configured container hooks: without a
//! before-mount hook `start()` does nothing at all, and the mount phase only
//! runs after a before-mount phase. `unmount()` gates each of its two phases
//! on its own hook only.

use crate::container::driver::{Action, LifecycleDriver};
use crate::container::{Context, ContainerConfig, LifecycleHooks, LifecycleState};
use crate::core::Result;
use crate::logging::Logger;
use crate::plugin::{Hook, Plugin, PluginRegistry, RegisteredPlugin};
use std::sync::Arc;
use tracing::debug;

/// Application container.
#[derive(Debug)]
pub struct Container {
    /// Lifecycle driver
    driver: LifecycleDriver,
    /// Plugin registry handle
    registry: Arc<PluginRegistry>,
    /// Shared context
    context: Context,
    /// Current logger
    logger: Arc<Logger>,
}

impl Container {
    /// Create a container with default config and a private registry.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Create a container with a private registry.
    pub fn with_config(config: ContainerConfig) -> Self {
        Self::with_registry(config, Arc::new(PluginRegistry::new()))
    }

    /// Create a container sharing `registry`.
    pub fn with_registry(config: ContainerConfig, registry: Arc<PluginRegistry>) -> Self {
        let logger = Arc::new(Logger::new(config.logger));
        Self {
            driver: LifecycleDriver::new(config.strict_lifecycle),
            registry,
            context: Context::new().with_logger(logger.clone()),
            logger,
        }
    }

    /// Replace the container's lifecycle hooks.
    pub fn register_lifecycle(&mut self, hooks: LifecycleHooks) {
        self.driver.set_hooks(hooks);
    }

    /// Register a plugin; an existing plugin with the same name is replaced.
    pub fn register_plugin<P: Plugin + 'static>(&self, plugin: P) {
        self.registry.register(Arc::new(plugin));
    }

    /// Merge `partial` into the container.
    ///
    /// If `partial` carries a logger, that logger becomes the container's
    /// logger and is attached to the current context; the rest of `partial`
    /// is dropped. Otherwise `partial` replaces the context outright and
    /// receives the container's logger.
    pub fn register_context(&mut self, partial: Context) {
        match partial.logger() {
            Some(logger) => {
                self.logger = logger;
                self.context.set_logger(self.logger.clone());
            }
            None => {
                self.context = partial;
                self.context.set_logger(self.logger.clone());
            }
        }
    }

    /// Live context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Current logger.
    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Registry handle.
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.driver.state()
    }

    /// Get plugin by name.
    pub fn plugin(&self, name: &str) -> Option<RegisteredPlugin> {
        self.registry.get(name)
    }

    /// Enable a plugin. Unknown names are ignored.
    pub fn enable_plugin(&self, name: &str) {
        self.registry.enable(name);
    }

    /// Disable a plugin. Unknown names are ignored.
    pub fn disable_plugin(&self, name: &str) {
        self.registry.disable(name);
    }

    /// Remove a plugin. Unknown names are ignored.
    pub fn remove_plugin(&self, name: &str) {
        self.registry.remove(name);
    }

    /// Start the container: before-mount, then mount.
    ///
    /// The context is reset (keeping the logger) before the before-mount
    /// hook runs. Calling `start()` again re-runs both phases unless
    /// `strict_lifecycle` is set.
    pub async fn start(&mut self) -> Result<()> {
        self.driver.check(Action::Start)?;

        if !self.driver.has_hook(Hook::BeforeMount) {
            debug!("No before-mount hook, start is a no-op");
            return Ok(());
        }

        self.register_context(Context::new());
        self.driver
            .run_phase(Hook::BeforeMount, &self.context, &self.registry, &self.logger)
            .await?;
        self.driver
            .run_phase(Hook::Mount, &self.context, &self.registry, &self.logger)
            .await
    }

    /// Unmount the container: before-unmount, then unmount.
    pub async fn unmount(&mut self) -> Result<()> {
        self.driver.check(Action::Unmount)?;

        self.driver
            .run_phase(Hook::BeforeUnmount, &self.context, &self.registry, &self.logger)
            .await?;
        self.driver
            .run_phase(Hook::Unmount, &self.context, &self.registry, &self.logger)
            .await
    }

    /// Run every enabled plugin's execute hook against the context.
    pub async fn execute_plugins(&self) -> Result<()> {
        self.registry.execute_all(&self.context).await
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::logging::{LogSink, LoggerConfig};
    use crate::plugin::{EchoPlugin, HookedPlugin, PluginError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn quiet() -> ContainerConfig {
        ContainerConfig {
            logger: LoggerConfig {
                sink: LogSink::Silent,
                ..LoggerConfig::default()
            },
            ..ContainerConfig::default()
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &'static str) -> LifecycleHooks {
        let push = |log: Arc<Mutex<Vec<String>>>, entry: String| {
            move |_: &Context| {
                log.lock().unwrap().push(entry.clone());
            }
        };
        let (a, b, c, d) = (
            push(log.clone(), format!("{label}:before-mount")),
            push(log.clone(), format!("{label}:mount")),
            push(log.clone(), format!("{label}:before-unmount")),
            push(log.clone(), format!("{label}:unmount")),
        );
        LifecycleHooks::empty()
            .on_before_mount(move |ctx| {
                a(ctx);
                Box::pin(async { Ok(()) })
            })
            .on_mount(move |ctx| {
                b(ctx);
                Box::pin(async { Ok(()) })
            })
            .on_before_unmount(move |ctx| {
                c(ctx);
                Box::pin(async { Ok(()) })
            })
            .on_unmount(move |ctx| {
                d(ctx);
                Box::pin(async { Ok(()) })
            })
    }

    fn plugin_recorder(name: &str, log: &Arc<Mutex<Vec<String>>>) -> HookedPlugin {
        let mut builder = HookedPlugin::builder(name);
        for phase in Hook::LIFECYCLE {
            let log = log.clone();
            let entry = format!("{name}:{phase}");
            let f = move |_: &Context| {
                log.lock().unwrap().push(entry.clone());
            };
            builder = match phase {
                Hook::BeforeMount => builder.on_before_mount(move |ctx| {
                    f(ctx);
                    Box::pin(async { Ok(()) })
                }),
                Hook::Mount => builder.on_mount(move |ctx| {
                    f(ctx);
                    Box::pin(async { Ok(()) })
                }),
                Hook::BeforeUnmount => builder.on_before_unmount(move |ctx| {
                    f(ctx);
                    Box::pin(async { Ok(()) })
                }),
                _ => builder.on_unmount(move |ctx| {
                    f(ctx);
                    Box::pin(async { Ok(()) })
                }),
            };
        }
        builder.build()
    }

    #[tokio::test]
    async fn test_start_and_unmount_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut container = Container::with_config(quiet());
        container.register_lifecycle(recorder(&log, "app"));
        container.register_plugin(plugin_recorder("p", &log));

        container.start().await.unwrap();
        assert_eq!(container.state(), LifecycleState::Mounted);

        container.unmount().await.unwrap();
        assert_eq!(container.state(), LifecycleState::Unmounted);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "app:before-mount",
                "p:before-mount",
                "app:mount",
                "p:mount",
                "app:before-unmount",
                "p:before-unmount",
                "app:unmount",
                "p:unmount",
            ]
        );
    }

    #[tokio::test]
    async fn test_lifecycle_logging() {
        let mut container = Container::with_config(quiet());
        container.start().await.unwrap();
        container.unmount().await.unwrap();

        assert_eq!(
            container.logger().get_logs(),
            vec![
                "[INFO] application preparing",
                "[INFO] plugins preparing",
                "[INFO] application mounted",
                "[INFO] plugins mounted",
                "[INFO] application preparing to unmount",
                "[INFO] plugins preparing to unmount",
                "[INFO] application unmounted",
                "[INFO] plugins unmounted",
            ]
        );
        assert_eq!(container.logger().search("plugins").len(), 4);
    }

    #[tokio::test]
    async fn test_metrics_plugin_mounts_once() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut container = Container::with_config(quiet());

        let list = seen.clone();
        container.register_plugin(
            HookedPlugin::builder("metrics")
                .on_mount(move |_| {
                    let list = list.clone();
                    Box::pin(async move {
                        list.lock().unwrap().push("mounted".to_string());
                        Ok(())
                    })
                })
                .build(),
        );

        container.start().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["mounted"]);
        assert!(container
            .registry()
            .eligible(Hook::BeforeMount)
            .is_empty());
    }

    #[tokio::test]
    async fn test_no_before_mount_hook_skips_mount() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut container = Container::with_config(quiet());

        let app_runs = runs.clone();
        container.register_lifecycle(LifecycleHooks::empty().on_mount(move |_| {
            let app_runs = app_runs.clone();
            Box::pin(async move {
                app_runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }));

        let plugin_runs = runs.clone();
        container.register_plugin(
            HookedPlugin::builder("mounter")
                .on_mount(move |_| {
                    let plugin_runs = plugin_runs.clone();
                    Box::pin(async move {
                        plugin_runs.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                })
                .build(),
        );

        container.start().await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(container.state(), LifecycleState::Unmounted);
        assert!(container.logger().get_logs().is_empty());
    }

    #[tokio::test]
    async fn test_no_mount_hook_runs_only_before_mount() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = recorder(&log, "app");
        hooks.on_mount = None;

        let mut container = Container::with_config(quiet());
        container.register_lifecycle(hooks);
        container.register_plugin(plugin_recorder("p", &log));
        container.start().await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["app:before-mount", "p:before-mount"]);
        assert_eq!(container.state(), LifecycleState::BeforeMount);
    }

    #[tokio::test]
    async fn test_no_before_unmount_hook_still_unmounts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = recorder(&log, "app");
        hooks.on_before_unmount = None;

        let mut container = Container::with_config(quiet());
        container.register_lifecycle(hooks);
        container.register_plugin(plugin_recorder("p", &log));
        container.start().await.unwrap();
        log.lock().unwrap().clear();

        container.unmount().await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["app:unmount", "p:unmount"]);
        assert_eq!(container.state(), LifecycleState::Unmounted);
    }

    #[tokio::test]
    async fn test_unmount_only_plugin_runs_without_before_unmount_hook() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut hooks = LifecycleHooks::default();
        hooks.on_before_unmount = None;

        let mut container = Container::with_config(quiet());
        container.register_lifecycle(hooks);
        let plugin_runs = runs.clone();
        container.register_plugin(
            HookedPlugin::builder("closer")
                .on_unmount(move |_| {
                    let plugin_runs = plugin_runs.clone();
                    Box::pin(async move {
                        plugin_runs.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                })
                .build(),
        );

        container.start().await.unwrap();
        container.unmount().await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(container.state(), LifecycleState::Unmounted);
    }

    #[tokio::test]
    async fn test_no_unmount_hooks_is_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = recorder(&log, "app");
        hooks.on_before_unmount = None;
        hooks.on_unmount = None;

        let mut container = Container::with_config(quiet());
        container.register_lifecycle(hooks);
        container.register_plugin(plugin_recorder("p", &log));
        container.start().await.unwrap();
        log.lock().unwrap().clear();

        container.unmount().await.unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(container.state(), LifecycleState::Mounted);
    }

    #[tokio::test]
    async fn test_plugin_failure_aborts_start_after_siblings() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut container = Container::with_config(quiet());
        container.register_lifecycle(recorder(&log, "app"));
        container.register_plugin(plugin_recorder("ok", &log));
        container.register_plugin(
            HookedPlugin::builder("bad")
                .on_before_mount(|_| Box::pin(async { Err(PluginError::new("bad config")) }))
                .build(),
        );

        let err = container.start().await.unwrap_err();

        assert!(matches!(err, Error::Broadcast { hook: Hook::BeforeMount, .. }));
        assert_eq!(err.hook_failures()[0].plugin, "bad");
        // The sibling ran; the mount phase never started.
        assert_eq!(*log.lock().unwrap(), vec!["app:before-mount", "ok:before-mount"]);
        assert_eq!(container.state(), LifecycleState::BeforeMount);
    }

    #[tokio::test]
    async fn test_register_context_with_logger_adopts_it() {
        let mut container = Container::with_config(quiet());
        container.context().set("kept", json!(1));

        let replacement = Arc::new(Logger::silent());
        container.register_context(
            Context::new()
                .with_logger(replacement.clone())
                .with_field("dropped", true),
        );

        let ctx_logger = container.context().logger().unwrap();
        assert!(Arc::ptr_eq(&ctx_logger, &replacement));
        assert!(Arc::ptr_eq(container.logger(), &replacement));
        assert!(container.context().contains("kept"));
        assert!(!container.context().contains("dropped"));
    }

    #[tokio::test]
    async fn test_register_context_without_logger_replaces() {
        let mut container = Container::with_config(quiet());
        let original = container.logger().clone();
        container.context().set("old", json!(true));

        container.register_context(Context::new().with_field("foo", 1));

        assert_eq!(container.context().keys(), vec!["foo"]);
        assert_eq!(container.context().get("foo"), Some(json!(1)));
        assert!(Arc::ptr_eq(&container.context().logger().unwrap(), &original));
    }

    #[tokio::test]
    async fn test_start_resets_context() {
        let mut container = Container::with_config(quiet());
        container.context().set("stale", json!(true));

        container.start().await.unwrap();

        assert!(!container.context().contains("stale"));
        assert!(container.context().logger().is_some());
    }

    #[tokio::test]
    async fn test_unmount_twice_runs_hooks_twice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut container = Container::with_config(quiet());
        container.register_lifecycle(recorder(&log, "app"));
        container.register_plugin(plugin_recorder("p", &log));

        container.unmount().await.unwrap();
        container.unmount().await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.iter().filter(|e| *e == "app:unmount").count(), 2);
        assert_eq!(log.iter().filter(|e| *e == "p:before-unmount").count(), 2);
    }

    #[tokio::test]
    async fn test_start_twice_without_guard() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut container = Container::with_config(quiet());
        container.register_lifecycle(recorder(&log, "app"));

        container.start().await.unwrap();
        container.start().await.unwrap();

        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_strict_lifecycle_guard() {
        let mut container = Container::with_config(quiet().strict());

        assert!(matches!(
            container.unmount().await,
            Err(Error::InvalidTransition { from: LifecycleState::Unmounted, .. })
        ));

        container.start().await.unwrap();
        assert!(matches!(
            container.start().await,
            Err(Error::InvalidTransition { from: LifecycleState::Mounted, .. })
        ));

        container.unmount().await.unwrap();
        container.start().await.unwrap();
        assert_eq!(container.state(), LifecycleState::Mounted);
    }

    #[tokio::test]
    async fn test_strict_unmount_after_failed_start() {
        let mut container = Container::with_config(quiet().strict());
        container.register_plugin(
            HookedPlugin::builder("bad")
                .on_before_mount(|_| Box::pin(async { Err(PluginError::new("bad config")) }))
                .build(),
        );

        assert!(matches!(
            container.start().await,
            Err(Error::Broadcast { hook: Hook::BeforeMount, .. })
        ));
        assert_eq!(container.state(), LifecycleState::BeforeMount);

        // A half-started container can still be torn down, and then restarted.
        assert!(matches!(
            container.start().await,
            Err(Error::InvalidTransition { from: LifecycleState::BeforeMount, .. })
        ));
        container.unmount().await.unwrap();
        assert_eq!(container.state(), LifecycleState::Unmounted);

        container.remove_plugin("bad");
        container.start().await.unwrap();
        assert_eq!(container.state(), LifecycleState::Mounted);
    }

    #[tokio::test]
    async fn test_container_hook_error() {
        let mut container = Container::with_config(quiet());
        container.register_lifecycle(
            LifecycleHooks::default()
                .on_mount(|_| Box::pin(async { Err(PluginError::fatal("port in use")) })),
        );

        let err = container.start().await.unwrap_err();
        assert_eq!(err.to_string(), "container mount hook failed: port in use");
    }

    #[tokio::test]
    async fn test_plugin_crud_through_container() {
        let mut container = Container::with_config(quiet());
        container.register_plugin(EchoPlugin::new());

        container.disable_plugin("echo");
        container.enable_plugin("missing");
        container.start().await.unwrap();
        assert!(!container.context().contains("echo"));
        assert!(!container.plugin("echo").unwrap().enabled);

        container.enable_plugin("echo");
        container.execute_plugins().await.unwrap();
        assert_eq!(container.context().get("echo"), Some(json!(["execute"])));

        container.remove_plugin("echo");
        container.remove_plugin("echo");
        assert!(container.plugin("echo").is_none());
    }

    #[tokio::test]
    async fn test_plugins_share_context_and_logger() {
        let mut container = Container::with_config(quiet());
        container.register_plugin(
            HookedPlugin::builder("i18n")
                .namespace("lang")
                .config("default", "en")
                .on_before_mount(|ctx| {
                    Box::pin(async move {
                        ctx.set("lang", json!("en"));
                        if let Some(logger) = ctx.logger() {
                            logger.info("i18n ready");
                        }
                        Ok(())
                    })
                })
                .build(),
        );

        container.start().await.unwrap();

        let info = container.plugin("i18n").unwrap().info;
        assert_eq!(container.context().get_for(&info), Some(json!("en")));
        assert_eq!(container.logger().search("i18n ready").len(), 1);
    }

    #[tokio::test]
    async fn test_shared_registry() {
        let registry = Arc::new(PluginRegistry::new());
        let first = Container::with_registry(quiet(), registry.clone());
        let second = Container::with_registry(quiet(), registry.clone());

        first.register_plugin(EchoPlugin::new());

        assert!(second.plugin("echo").is_some());
        assert_eq!(registry.len(), 1);
    }
}
