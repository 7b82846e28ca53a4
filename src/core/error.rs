//! Error types for appkit.

use crate::container::LifecycleState;
use crate::plugin::{Hook, PluginError};
use thiserror::Error;

/// Result type alias for appkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single plugin hook that failed during a broadcast.
#[derive(Clone, Debug)]
pub struct HookFailure {
    /// Name of the failing plugin
    pub plugin: String,
    /// Error returned by the hook
    pub error: PluginError,
}

impl std::fmt::Display for HookFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "plugin '{}': {}", self.plugin, self.error)
    }
}

/// Errors that can occur in appkit operations.
#[derive(Error, Debug)]
pub enum Error {
    // Lifecycle errors
    #[error("{hook} broadcast failed for {}", summarize(.failures))]
    Broadcast {
        hook: Hook,
        failures: Vec<HookFailure>,
    },

    #[error("container {phase} hook failed: {source}")]
    ContainerHook {
        phase: Hook,
        #[source]
        source: PluginError,
    },

    #[error("cannot {action} while container is {from}")]
    InvalidTransition {
        from: LifecycleState,
        action: &'static str,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Plugin failures carried by a broadcast error, empty for other variants.
    pub fn hook_failures(&self) -> &[HookFailure] {
        match self {
            Error::Broadcast { failures, .. } => failures,
            _ => &[],
        }
    }
}

fn summarize(failures: &[HookFailure]) -> String {
    match failures.first() {
        Some(first) => format!("{} plugin(s); first: {}", failures.len(), first),
        None => "0 plugin(s)".to_string(),
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
