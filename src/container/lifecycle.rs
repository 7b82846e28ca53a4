//! Lifecycle hook slots and container states.

use crate::container::Context;
use crate::plugin::{Hook, PluginResult};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An async hook taking the shared context.
pub type HookFn = Arc<dyn for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync>;

/// Container lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Not started, or fully torn down
    Unmounted,
    /// Before-mount phase entered
    BeforeMount,
    /// Mount phase completed
    Mounted,
    /// Before-unmount phase entered
    BeforeUnmount,
}

impl LifecycleState {
    /// State while `phase` is running; `None` for non-lifecycle hooks.
    pub fn entering(phase: Hook) -> Option<Self> {
        match phase {
            Hook::BeforeMount => Some(LifecycleState::BeforeMount),
            Hook::Mount => Some(LifecycleState::BeforeMount),
            Hook::BeforeUnmount => Some(LifecycleState::BeforeUnmount),
            Hook::Unmount => Some(LifecycleState::BeforeUnmount),
            Hook::Execute => None,
        }
    }

    /// State after `phase` completed successfully.
    pub fn settled(phase: Hook) -> Option<Self> {
        match phase {
            Hook::BeforeMount => Some(LifecycleState::BeforeMount),
            Hook::Mount => Some(LifecycleState::Mounted),
            Hook::BeforeUnmount => Some(LifecycleState::BeforeUnmount),
            Hook::Unmount => Some(LifecycleState::Unmounted),
            Hook::Execute => None,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Unmounted => write!(f, "unmounted"),
            LifecycleState::BeforeMount => write!(f, "before-mount"),
            LifecycleState::Mounted => write!(f, "mounted"),
            LifecycleState::BeforeUnmount => write!(f, "before-unmount"),
        }
    }
}

fn noop() -> HookFn {
    fn run(_ctx: &Context) -> BoxFuture<'_, PluginResult<()>> {
        Box::pin(async { Ok(()) })
    }
    Arc::new(run)
}

/// Four optional lifecycle hooks.
///
/// `Default` fills every slot with a no-op; [`LifecycleHooks::empty`] leaves
/// them all unset. An unset slot gates its phase (see `Container::start`).
#[derive(Clone)]
pub struct LifecycleHooks {
    /// Runs before mounting
    pub on_before_mount: Option<HookFn>,
    /// Runs on mount
    pub on_mount: Option<HookFn>,
    /// Runs before unmounting
    pub on_before_unmount: Option<HookFn>,
    /// Runs on unmount
    pub on_unmount: Option<HookFn>,
}

impl LifecycleHooks {
    /// Hook set with no slots filled.
    pub fn empty() -> Self {
        Self {
            on_before_mount: None,
            on_mount: None,
            on_before_unmount: None,
            on_unmount: None,
        }
    }

    /// Set the before-mount hook.
    pub fn on_before_mount<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.on_before_mount = Some(Arc::new(f));
        self
    }

    /// Set the mount hook.
    pub fn on_mount<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.on_mount = Some(Arc::new(f));
        self
    }

    /// Set the before-unmount hook.
    pub fn on_before_unmount<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.on_before_unmount = Some(Arc::new(f));
        self
    }

    /// Set the unmount hook.
    pub fn on_unmount<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context) -> BoxFuture<'a, PluginResult<()>> + Send + Sync + 'static,
    {
        self.on_unmount = Some(Arc::new(f));
        self
    }

    /// Hook in the slot for `phase`.
    pub fn get(&self, phase: Hook) -> Option<&HookFn> {
        match phase {
            Hook::BeforeMount => self.on_before_mount.as_ref(),
            Hook::Mount => self.on_mount.as_ref(),
            Hook::BeforeUnmount => self.on_before_unmount.as_ref(),
            Hook::Unmount => self.on_unmount.as_ref(),
            Hook::Execute => None,
        }
    }

    /// Phases with a filled slot, in lifecycle order.
    pub fn defined(&self) -> Vec<Hook> {
        Hook::LIFECYCLE
            .into_iter()
            .filter(|phase| self.get(*phase).is_some())
            .collect()
    }
}

impl Default for LifecycleHooks {
    fn default() -> Self {
        Self {
            on_before_mount: Some(noop()),
            on_mount: Some(noop()),
            on_before_unmount: Some(noop()),
            on_unmount: Some(noop()),
        }
    }
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("defined", &self.defined())
            .finish()
    }
}
