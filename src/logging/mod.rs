//! Logging Module
//!
//! - Leveled, buffered logger shared through the context
//! - `tracing` subscriber setup

pub mod logger;
pub mod subscriber;

pub use logger::{LogEntry, LogLevel, LogSink, Logger, LoggerConfig};
pub use subscriber::init_tracing;
