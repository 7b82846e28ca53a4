//! Shared application context.
//!
//! One context lives inside the container and is lent to every lifecycle
//! and plugin hook. Fields are plain JSON values behind a short-lived lock,
//! so hooks running in the same broadcast can write through `&Context`.
//! Nothing arbitrates between two hooks writing the same key; plugins are
//! expected to keep to their own slot (see [`PluginInfo::context_key`]).

use crate::core::types::{read_lock, write_lock};
use crate::logging::Logger;
use crate::plugin::PluginInfo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Context passed to every lifecycle and plugin hook.
#[derive(Debug, Default)]
pub struct Context {
    /// Attached logger
    logger: Option<Arc<Logger>>,
    /// Plugin-contributed fields
    fields: RwLock<HashMap<String, Value>>,
}

impl Context {
    /// Create an empty context without a logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a logger.
    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Add a field. Values that fail to serialize are skipped with a warning.
    pub fn with_field(self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.set(key, v);
            }
            Err(e) => warn!(key = %key, error = %e, "Context field not serializable, skipped"),
        }
        self
    }

    /// Attached logger, if any.
    pub fn logger(&self) -> Option<Arc<Logger>> {
        self.logger.clone()
    }

    /// Replace the attached logger.
    pub fn set_logger(&mut self, logger: Arc<Logger>) {
        self.logger = Some(logger);
    }

    /// Get a field.
    pub fn get(&self, key: &str) -> Option<Value> {
        read_lock(&self.fields).get(key).cloned()
    }

    /// Get a field deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    /// Set a field, returning the previous value.
    pub fn set(&self, key: &str, value: Value) -> Option<Value> {
        write_lock(&self.fields).insert(key.to_string(), value)
    }

    /// Update a field in place, inserting `Value::Null` first if absent.
    pub fn update<F>(&self, key: &str, f: F)
    where
        F: FnOnce(&mut Value),
    {
        let mut fields = write_lock(&self.fields);
        f(fields.entry(key.to_string()).or_insert(Value::Null));
    }

    /// Remove a field.
    pub fn remove(&self, key: &str) -> Option<Value> {
        write_lock(&self.fields).remove(key)
    }

    /// Check whether a field exists.
    pub fn contains(&self, key: &str) -> bool {
        read_lock(&self.fields).contains_key(key)
    }

    /// Field names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = read_lock(&self.fields).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        read_lock(&self.fields).len()
    }

    /// True when no fields are set.
    pub fn is_empty(&self) -> bool {
        read_lock(&self.fields).is_empty()
    }

    /// Copy of all fields.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        read_lock(&self.fields).clone()
    }

    /// Write into the slot owned by a plugin.
    pub fn insert_for(&self, plugin: &PluginInfo, value: Value) -> Option<Value> {
        self.set(plugin.context_key(), value)
    }

    /// Read the slot owned by a plugin.
    pub fn get_for(&self, plugin: &PluginInfo) -> Option<Value> {
        self.get(plugin.context_key())
    }
}
