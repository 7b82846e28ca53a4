//! Core utilities and common types for appkit.

pub mod error;
pub mod types;

pub use error::{Error, HookFailure, Result};
pub use types::*;
