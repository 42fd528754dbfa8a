//! Key-value settings store.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::write_atomically;
use crate::common::utils::private_path;

/// Blocking key-value store of JSON values.
///
/// `get` never fails: an absent key, an unreadable backing file or a corrupt
/// document all read as "nothing stored", and callers substitute defaults.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// In-process store, used by tests and one-shot commands without a state dir.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<Map<String, Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by one JSON object file. Every `set` rewrites the file.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", private_path(&self.path)))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)
            .with_context(|| format!("Failed to parse {}", private_path(&self.path)))?
        {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!(
                "{} holds a JSON {} instead of an object",
                private_path(&self.path),
                json_kind(&other)
            ),
        }
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        match self.read_document() {
            Ok(mut document) => document.remove(key),
            Err(e) => {
                log_warning!("Settings unavailable, using defaults: {e:#}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        // A corrupt document is replaced rather than blocking every save
        let mut document = self.read_document().unwrap_or_else(|e| {
            log_warning!("Discarding unreadable settings: {e:#}");
            Map::new()
        });
        document.insert(key.to_string(), value);

        let bytes = serde_json::to_vec_pretty(&Value::Object(document))
            .context("Failed to serialize settings")?;
        write_atomically(&self.path, &bytes)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
