//! Plugin interface definition.
//!
//! Defines the interface plugins must implement, plus a closure-based
//! plugin for authors who only need a couple of hooks.

use crate::container::{Context, HookFn, LifecycleHooks};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Plugin information.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin name
    pub name: String,
    /// Version
    pub version: String,
    /// Description
    pub description: String,
    /// Opaque plugin configuration
    pub config: HashMap<String, serde_json::Value>,
    /// Context slot override, used when `name` would collide
    pub namespace: Option<String>,
}

impl PluginInfo {
    /// Create new plugin info.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: String::new(),
            config: HashMap::new(),
            namespace: None,
        }
    }

    /// Set description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Set namespace.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Add a config entry. Values that fail to serialize are skipped with a warning.
    pub fn with_config(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.config.insert(key.to_string(), v);
            }
            Err(e) => warn!(
                plugin = %self.name,
                key = %key,
                error = %e,
                "Plugin config entry not serializable, skipped"
            ),
        }
        self
    }

    /// Get config value.
    pub fn config_value<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Context field this plugin writes to: the namespace if set, else the name.
    pub fn context_key(&self) -> &str {
        self.namespace.as_deref().unwrap_or(&self.name)
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Plugin-specific error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginError {
    /// Error message
    pub message: String,
    /// Error code
    pub code: i32,
    /// Is recoverable
    pub recoverable: bool,
}

impl PluginError {
    /// Create a new error.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            code: -1,
            recoverable: true,
        }
    }

    /// Create a fatal error.
    pub fn fatal(message: &str) -> Self {
        Self {
            message: message.to_string(),
            code: -1,
            recoverable: false,
        }
    }

    /// Set error code.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if self.code != -1 {
            write!(f, " (code {})", self.code)?;
        }
        Ok(())
    }
}

impl std::error::Error for PluginError {}

impl From<String> for PluginError {
    fn from(message: String) -> Self {
        Self::new(&message)
    }
}

impl From<&str> for PluginError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Hook points a plugin can answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hook {
    /// Before the container mounts
    BeforeMount,
    /// Container mount
    Mount,
    /// Before the container unmounts
    BeforeUnmount,
    /// Container unmount
    Unmount,
    /// Explicit execution, outside the lifecycle
    Execute,
}

impl Hook {
    /// Lifecycle phases in the order the container runs them.
    pub const LIFECYCLE: [Hook; 4] = [
        Hook::BeforeMount,
        Hook::Mount,
        Hook::BeforeUnmount,
        Hook::Unmount,
    ];

    /// True for the two preparatory phases.
    pub fn is_before(self) -> bool {
        matches!(self, Hook::BeforeMount | Hook::BeforeUnmount)
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hook::BeforeMount => write!(f, "before-mount"),
            Hook::Mount => write!(f, "mount"),
            Hook::BeforeUnmount => write!(f, "before-unmount"),
            Hook::Unmount => write!(f, "unmount"),
            Hook::Execute => write!(f, "execute"),
        }
    }
}

/// Plugin trait that all plugins must implement.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Get plugin info.
    fn info(&self) -> PluginInfo;

    /// Get supported hooks.
    fn hooks(&self) -> Vec<Hook> {
        Vec::new()
    }

    /// Run one hook. Only called for hooks listed by [`Plugin::hooks`].
    async fn call_hook(&self, hook: Hook, ctx: &Context) -> PluginResult<()> {
        let _ = (hook, ctx);
        Ok(())
    }
}

/// Plugin built from optional hook closures.
#[derive(Clone)]
pub struct HookedPlugin {
    info: PluginInfo,
    lifecycle: LifecycleHooks,
    execute: Option<HookFn>,
}

impl HookedPlugin {
    /// Start building a plugin named `name`.
    pub fn builder(name: &str) -> PluginBuilder {
        PluginBuilder::new(name)
    }

    fn slot(&self, hook: Hook) -> Option<&HookFn> {
        match hook {
            Hook::Execute => self.execute.as_ref(),
            phase => self.lifecycle.get(phase),
        }
    }
}

impl std::fmt::Debug for HookedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookedPlugin")
            .field("info", &self.info)
            .field("hooks", &self.hooks())
            .finish()
    }
}

#[async_trait]
impl Plugin for HookedPlugin {
    fn info(&self) -> PluginInfo {
        self.info.clone()
    }

    fn hooks(&self) -> Vec<Hook> {
        let mut hooks = self.lifecycle.defined();
        if self.execute.is_some() {
            hooks.push(Hook::Execute);
        }
        hooks
    }

    async fn call_hook(&self, hook: Hook, ctx: &Context) -> PluginResult<()> {
        match self.slot(hook) {
            Some(f) => f(ctx).await,
            None => Ok(()),
        }
    }
}

/// Builder for [`HookedPlugin`].
pub struct PluginBuilder {
    info: PluginInfo,
    lifecycle: LifecycleHooks,
    execute: Option<HookFn>,
}

impl PluginBuilder {
    /// Create a builder with version `0.0.0` and no hooks.
    pub fn new(name: &str) -> Self {
        Self {
            info: PluginInfo::new(name, "0.0.0"),
            lifecycle: LifecycleHooks::empty(),
            execute: None,
        }
    }

    /// Set version.
    pub fn version(mut self, version: &str) -> Self {
        self.info.version = version.to_string();
        self
    }

    /// Set description.
    pub fn description(mut self, desc: &str) -> Self {
        self.info = self.info.with_description(desc);
        self
    }

    /// Set namespace.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.info = self.info.with_namespace(namespace);
        self
    }

    /// Add a config entry.
    pub fn config(mut self, key: &str, value: impl Serialize) -> Self {
        self.info = self.info.with_config(key, value);
        self
    }

    /// Set the before-mount hook.
    pub fn on_before_mount<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.lifecycle = self.lifecycle.on_before_mount(f);
        self
    }

    /// Set the mount hook.
    pub fn on_mount<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.lifecycle = self.lifecycle.on_mount(f);
        self
    }

    /// Set the before-unmount hook.
    pub fn on_before_unmount<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.lifecycle = self.lifecycle.on_before_unmount(f);
        self
    }

    /// Set the unmount hook.
    pub fn on_unmount<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.lifecycle = self.lifecycle.on_unmount(f);
        self
    }

    /// Set the execute hook.
    pub fn execute<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.execute = Some(Arc::new(f));
        self
    }

    /// Finish the plugin.
    pub fn build(self) -> HookedPlugin {
        HookedPlugin {
            info: self.info,
            lifecycle: self.lifecycle,
            execute: self.execute,
        }
    }
}

/// A plugin that records each hook it sees into its context slot.
pub struct EchoPlugin {
    info: PluginInfo,
}

impl EchoPlugin {
    /// Create a new echo plugin.
    pub fn new() -> Self {
        Self {
            info: PluginInfo::new("echo", "1.0.0")
                .with_description("Records every hook it receives"),
        }
    }
}

impl Default for EchoPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for EchoPlugin {
    fn info(&self) -> PluginInfo {
        self.info.clone()
    }

    fn hooks(&self) -> Vec<Hook> {
        vec![
            Hook::BeforeMount,
            Hook::Mount,
            Hook::BeforeUnmount,
            Hook::Unmount,
            Hook::Execute,
        ]
    }

    async fn call_hook(&self, hook: Hook, ctx: &Context) -> PluginResult<()> {
        ctx.update(self.info.context_key(), |seen| {
            if !seen.is_array() {
                *seen = serde_json::Value::Array(Vec::new());
            }
            if let Some(list) = seen.as_array_mut() {
                list.push(serde_json::Value::String(hook.to_string()));
            }
        });
        Ok(())
    }
}
