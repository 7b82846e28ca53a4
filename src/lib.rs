//! # appkit - application container with lifecycle plugins
//!
//! A small container that owns one shared [`Context`], drives it through a
//! four-phase lifecycle and fans each phase out to registered plugins:
//! - **Container**: `start()` runs before-mount then mount, `unmount()` runs
//!   before-unmount then unmount
//! - **Plugins**: named, individually enabled, answering any subset of the
//!   lifecycle hooks plus `execute`
//! - **Logger**: leveled, buffered, shared through the context
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use appkit::{Container, HookedPlugin};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> appkit::Result<()> {
//!     let mut app = Container::new();
//!     app.register_plugin(
//!         HookedPlugin::builder("metrics")
//!             .on_mount(|ctx| {
//!                 Box::pin(async move {
//!                     ctx.set("metrics", json!({"enabled": true}));
//!                     Ok(())
//!                 })
//!             })
//!             .build(),
//!     );
//!
//!     app.start().await?;
//!     println!("{:?}", app.context().get("metrics"));
//!     app.unmount().await
//! }
//! ```

pub mod container;
pub mod core;
pub mod logging;
pub mod plugin;

pub use container::{Container, ContainerConfig, Context, LifecycleHooks, LifecycleState};
pub use crate::core::error::{Error, HookFailure, Result};
pub use logging::{LogLevel, Logger, LoggerConfig};
pub use plugin::{Hook, HookedPlugin, Plugin, PluginError, PluginInfo, PluginRegistry, PluginResult};
