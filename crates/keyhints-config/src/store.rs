//! In-memory settings store.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use keyhints_protocols::{SettingsChange, SettingsStore};

use crate::error::ConfigError;
use crate::schema::Settings;

const CHANGE_CAPACITY: usize = 64;

/// Settings store backed by a map of overrides on top of defaults.
pub struct MemorySettingsStore {
    defaults: HashMap<String, Value>,
    values: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<SettingsChange>,
}

impl MemorySettingsStore {
    /// Create a store whose defaults and initial values come from `settings`.
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let defaults = object_entries(serde_json::to_value(Settings::default())?);
        let values = object_entries(serde_json::to_value(settings)?)
            .into_iter()
            .filter(|(k, v)| defaults.get(k) != Some(v))
            .collect();
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Ok(Self {
            defaults,
            values: RwLock::new(values),
            changes,
        })
    }

    /// Remove an override so the default applies again.
    pub fn clear(&self, key: &str) {
        let removed = self.values.write().remove(key);
        if removed.is_some() {
            let _ = self.changes.send(SettingsChange {
                key: key.to_string(),
                value: self.defaults.get(key).cloned(),
            });
        }
    }

    /// Rebuild a typed snapshot of the current settings.
    pub fn snapshot(&self) -> Result<Settings, ConfigError> {
        let mut merged = serde_json::Map::new();
        for (k, v) in &self.defaults {
            merged.insert(k.clone(), v.clone());
        }
        for (k, v) in self.values.read().iter() {
            merged.insert(k.clone(), v.clone());
        }
        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .get(key)
            .cloned()
            .or_else(|| self.defaults.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) {
        debug!("settings: set {}", key);
        self.values.write().insert(key.to_string(), value.clone());
        let _ = self.changes.send(SettingsChange {
            key: key.to_string(),
            value: Some(value),
        });
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.changes.subscribe()
    }
}

fn object_entries(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}
