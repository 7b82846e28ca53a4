//! Plugin registry for managing plugins.
//!
//! Handles registration, enable/disable/remove, and hook broadcast.
//!
//! A broadcast issues the hook on every eligible plugin at once and drives
//! all of them to completion on the caller's task. Failures are collected
//! and reported only after every hook has settled, so one failing plugin
//! never stops its siblings from running.

use crate::container::Context;
use crate::core::types::{read_lock, write_lock};
use crate::core::{now, Error, HookFailure, Result, Timestamp};
use crate::plugin::interface::{Hook, Plugin, PluginInfo};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{debug, warn};

/// Registered plugin entry.
#[derive(Clone)]
pub struct RegisteredPlugin {
    /// Plugin instance
    pub plugin: Arc<dyn Plugin>,
    /// Plugin info, captured at registration
    pub info: PluginInfo,
    /// Hooks the plugin answers
    pub hooks: Vec<Hook>,
    /// Whether broadcasts reach this plugin
    pub enabled: bool,
    /// Registration time
    pub registered_at: Timestamp,
}

impl RegisteredPlugin {
    /// Whether a broadcast of `hook` should reach this plugin.
    pub fn is_eligible(&self, hook: Hook) -> bool {
        self.enabled && self.hooks.contains(&hook)
    }
}

impl std::fmt::Debug for RegisteredPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredPlugin")
            .field("info", &self.info)
            .field("hooks", &self.hooks)
            .field("enabled", &self.enabled)
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

/// Plugin registry.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Registered plugins by name
    plugins: RwLock<HashMap<String, RegisteredPlugin>>,
}

static GLOBAL: OnceLock<Arc<PluginRegistry>> = OnceLock::new();

impl PluginRegistry {
    /// Create a new registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first use.
    pub fn global() -> Arc<PluginRegistry> {
        GLOBAL.get_or_init(|| Arc::new(PluginRegistry::new())).clone()
    }

    /// Register a plugin, replacing any plugin with the same name.
    ///
    /// The entry is always enabled afterwards.
    pub fn register(&self, plugin: Arc<dyn Plugin>) {
        let info = plugin.info();
        let name = info.name.clone();
        let hooks = plugin.hooks();

        debug!(plugin = %name, version = %info.version, hooks = hooks.len(), "Plugin registered");

        write_lock(&self.plugins).insert(
            name,
            RegisteredPlugin {
                plugin,
                info,
                hooks,
                enabled: true,
                registered_at: now(),
            },
        );
    }

    /// Get plugin by name.
    pub fn get(&self, name: &str) -> Option<RegisteredPlugin> {
        read_lock(&self.plugins).get(name).cloned()
    }

    /// Enable a plugin. Unknown names are ignored.
    pub fn enable(&self, name: &str) {
        self.set_enabled(name, true);
    }

    /// Disable a plugin. Unknown names are ignored.
    pub fn disable(&self, name: &str) {
        self.set_enabled(name, false);
    }

    fn set_enabled(&self, name: &str, enabled: bool) {
        if let Some(entry) = write_lock(&self.plugins).get_mut(name) {
            entry.enabled = enabled;
        }
    }

    /// Remove a plugin. Unknown names are ignored.
    ///
    /// Hooks already running keep their own handle and finish normally.
    pub fn remove(&self, name: &str) {
        if write_lock(&self.plugins).remove(name).is_some() {
            debug!(plugin = %name, "Plugin removed");
        }
    }

    /// List all plugins.
    pub fn list(&self) -> Vec<PluginInfo> {
        read_lock(&self.plugins)
            .values()
            .map(|p| p.info.clone())
            .collect()
    }

    /// Names of enabled plugins, sorted.
    pub fn enabled_plugins(&self) -> Vec<String> {
        let mut names: Vec<String> = read_lock(&self.plugins)
            .values()
            .filter(|p| p.enabled)
            .map(|p| p.info.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Get plugin count.
    pub fn len(&self) -> usize {
        read_lock(&self.plugins).len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        read_lock(&self.plugins).is_empty()
    }

    /// Plugins a broadcast of `hook` would reach right now.
    pub fn eligible(&self, hook: Hook) -> Vec<(String, Arc<dyn Plugin>)> {
        read_lock(&self.plugins)
            .values()
            .filter(|p| p.is_eligible(hook))
            .map(|p| (p.info.name.clone(), p.plugin.clone()))
            .collect()
    }

    /// Run `hook` on every eligible plugin and wait for all of them.
    ///
    /// Returns [`Error::Broadcast`] listing every failed plugin once all
    /// hooks have settled.
    pub async fn broadcast(&self, hook: Hook, ctx: &Context) -> Result<()> {
        let targets = self.eligible(hook);
        if targets.is_empty() {
            debug!(hook = %hook, "No plugins for hook");
            return Ok(());
        }

        debug!(hook = %hook, plugin_count = targets.len(), "Broadcasting hook");

        let outcomes = join_all(targets.iter().map(|(name, plugin)| async move {
            (name, plugin.call_hook(hook, ctx).await)
        }))
        .await;

        let failures: Vec<HookFailure> = outcomes
            .into_iter()
            .filter_map(|(name, outcome)| {
                outcome.err().map(|error| {
                    warn!(hook = %hook, plugin = %name, error = %error, "Plugin hook failed");
                    HookFailure {
                        plugin: name.clone(),
                        error,
                    }
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Broadcast { hook, failures })
        }
    }

    /// Run every enabled plugin's execute hook.
    pub async fn execute_all(&self, ctx: &Context) -> Result<()> {
        self.broadcast(Hook::Execute, ctx).await
    }
}
