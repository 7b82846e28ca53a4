//! Plugin Module
//!
//! Provides the plugin side of the container:
//! - Plugin interface and closure-based plugins
//! - Plugin registry with concurrent hook broadcast

pub mod interface;
pub mod registry;

pub use interface::{
    EchoPlugin, Hook, HookedPlugin, Plugin, PluginBuilder, PluginError, PluginInfo, PluginResult,
};
pub use registry::{PluginRegistry, RegisteredPlugin};
