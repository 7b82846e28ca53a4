//! Lifecycle driver.
//!
//! Runs one phase at a time: the container's own hook first, then the
//! registry broadcast for the same phase. Each step finishes before the
//! next one starts.

use crate::container::{Context, LifecycleHooks, LifecycleState};
use crate::core::{Error, Result};
use crate::logging::Logger;
use crate::plugin::{Hook, PluginRegistry};
use tracing::debug;

/// Entry points the re-entry guard checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// `Container::start`
    Start,
    /// `Container::unmount`
    Unmount,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Unmount => "unmount",
        }
    }
}

/// Log lines around the two steps of a phase.
fn phase_messages(phase: Hook) -> (&'static str, &'static str) {
    match phase {
        Hook::BeforeMount => ("application preparing", "plugins preparing"),
        Hook::Mount => ("application mounted", "plugins mounted"),
        Hook::BeforeUnmount => ("application preparing to unmount", "plugins preparing to unmount"),
        Hook::Unmount => ("application unmounted", "plugins unmounted"),
        Hook::Execute => ("application executing", "plugins executed"),
    }
}

/// Drives the container's lifecycle hooks and the matching broadcasts.
#[derive(Debug)]
pub struct LifecycleDriver {
    /// Container hooks
    hooks: LifecycleHooks,
    /// Current state
    state: LifecycleState,
    /// Re-entry guard
    strict: bool,
}

impl LifecycleDriver {
    /// Create a driver with default no-op hooks.
    pub fn new(strict: bool) -> Self {
        Self {
            hooks: LifecycleHooks::default(),
            state: LifecycleState::Unmounted,
            strict,
        }
    }

    /// Replace the hook set wholesale.
    pub fn set_hooks(&mut self, hooks: LifecycleHooks) {
        self.hooks = hooks;
    }

    /// Current hook set.
    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the container hook for `phase` is configured.
    pub fn has_hook(&self, phase: Hook) -> bool {
        self.hooks.get(phase).is_some()
    }

    /// Reject `action` from the current state when the guard is on.
    pub fn check(&self, action: Action) -> Result<()> {
        if !self.strict {
            return Ok(());
        }
        let allowed = match action {
            Action::Start => self.state == LifecycleState::Unmounted,
            Action::Unmount => self.state != LifecycleState::Unmounted,
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.state,
                action: action.as_str(),
            })
        }
    }

    /// Run `phase`: container hook, then plugin broadcast.
    ///
    /// Does nothing when the container hook for `phase` is unset.
    pub async fn run_phase(
        &mut self,
        phase: Hook,
        ctx: &Context,
        registry: &PluginRegistry,
        logger: &Logger,
    ) -> Result<()> {
        let Some(hook) = self.hooks.get(phase).cloned() else {
            debug!(phase = %phase, "Container hook not set, skipping phase");
            return Ok(());
        };
        let (app_msg, plugins_msg) = phase_messages(phase);
        let before = phase.is_before();

        if let Some(state) = LifecycleState::entering(phase) {
            self.state = state;
        }

        if before {
            logger.info(app_msg);
        }
        hook(ctx)
            .await
            .map_err(|source| Error::ContainerHook { phase, source })?;
        if !before {
            logger.info(app_msg);
        }

        if before {
            logger.info(plugins_msg);
        }
        registry.broadcast(phase, ctx).await?;
        if !before {
            logger.info(plugins_msg);
        }

        if let Some(state) = LifecycleState::settled(phase) {
            self.state = state;
        }
        Ok(())
    }
}
