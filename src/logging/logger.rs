//! Leveled logger with an in-memory line buffer.
//!
//! Every emitted line is written to the configured sink and kept in an
//! ordered buffer that can be read back in full or searched by substring.

use crate::core::types::{read_lock, write_lock};
use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;

/// Log level, ordered from most severe to most verbose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level (always emitted)
    Error = 0,
    /// Warning level
    Warn = 1,
    /// Info level
    Info = 2,
    /// Debug level (most verbose)
    Debug = 3,
}

impl LogLevel {
    /// Whether a message at `self` passes a `threshold`.
    pub fn passes(self, threshold: LogLevel) -> bool {
        self <= threshold
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Debug => write!(f, "DEBUG"),
        }
    }
}

/// A buffered log entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp
    pub timestamp: Timestamp,
    /// Log level
    pub level: LogLevel,
    /// Message
    pub message: String,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(level: LogLevel, message: &str) -> Self {
        Self {
            timestamp: now(),
            level,
            message: message.to_string(),
        }
    }

    /// Format as a `[LEVEL] message` line.
    pub fn to_line(&self) -> String {
        format!("[{}] {}", self.level, self.message)
    }
}

/// Where emitted lines go besides the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSink {
    /// Standard error
    Stderr,
    /// `tracing` events at the matching level
    Tracing,
    /// Buffer only
    Silent,
}

/// Logger configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum severity that gets emitted
    pub level: LogLevel,
    /// Output sink
    pub sink: LogSink,
    /// Maximum buffered entries, unbounded when `None`
    pub max_buffer: Option<usize>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            sink: LogSink::Stderr,
            max_buffer: None,
        }
    }
}

/// Logger shared between the container and its plugins.
#[derive(Debug)]
pub struct Logger {
    /// Current threshold
    level: RwLock<LogLevel>,
    /// Output sink
    sink: LogSink,
    /// Maximum buffer size
    max_buffer: Option<usize>,
    /// Emitted entries in order
    buffer: RwLock<VecDeque<LogEntry>>,
}

impl Logger {
    /// Create a new logger.
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            level: RwLock::new(config.level),
            sink: config.sink,
            max_buffer: config.max_buffer,
            buffer: RwLock::new(VecDeque::new()),
        }
    }

    /// Create a logger that only buffers.
    pub fn silent() -> Self {
        Self::new(LoggerConfig {
            sink: LogSink::Silent,
            ..LoggerConfig::default()
        })
    }

    /// Current threshold.
    pub fn level(&self) -> LogLevel {
        *read_lock(&self.level)
    }

    /// Set log level.
    pub fn set_level(&self, level: LogLevel) {
        *write_lock(&self.level) = level;
    }

    /// Log a message at `level`.
    pub fn log(&self, level: LogLevel, message: &str) {
        if !level.passes(self.level()) {
            return;
        }

        let entry = LogEntry::new(level, message);
        let line = entry.to_line();

        match self.sink {
            LogSink::Stderr => eprintln!("{}", line),
            LogSink::Tracing => match level {
                LogLevel::Error => tracing::error!(target: "appkit", "{}", entry.message),
                LogLevel::Warn => tracing::warn!(target: "appkit", "{}", entry.message),
                LogLevel::Info => tracing::info!(target: "appkit", "{}", entry.message),
                LogLevel::Debug => tracing::debug!(target: "appkit", "{}", entry.message),
            },
            LogSink::Silent => {}
        }

        let mut buffer = write_lock(&self.buffer);
        if let Some(max) = self.max_buffer {
            if max == 0 {
                return;
            }
            while buffer.len() >= max {
                buffer.pop_front();
            }
        }
        buffer.push_back(entry);
    }

    /// Log at error level.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// All emitted lines, oldest first.
    pub fn get_logs(&self) -> Vec<String> {
        read_lock(&self.buffer).iter().map(LogEntry::to_line).collect()
    }

    /// Emitted lines containing `query`.
    pub fn search(&self, query: &str) -> Vec<String> {
        read_lock(&self.buffer)
            .iter()
            .map(LogEntry::to_line)
            .filter(|line| line.contains(query))
            .collect()
    }

    /// Structured copies of the buffered entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        read_lock(&self.buffer).iter().cloned().collect()
    }

    /// Clear the buffer.
    pub fn clear(&self) {
        write_lock(&self.buffer).clear();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}
