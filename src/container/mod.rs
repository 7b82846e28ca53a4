//! Container Module
//!
//! The composition root and everything it drives:
//! - Shared context
//! - Lifecycle hooks and states
//! - Lifecycle driver
//! - Container configuration

pub mod app;
pub mod config;
pub mod context;
pub mod driver;
pub mod lifecycle;

pub use app::Container;
pub use config::ContainerConfig;
pub use context::Context;
pub use driver::LifecycleDriver;
pub use lifecycle::{HookFn, LifecycleHooks, LifecycleState};
