//! Settings collaborator protocol.
//!
//! Settings persistence lives outside this workspace; consumers only see
//! `get`/`set` over JSON values plus a change feed.

use serde_json::Value;
use tokio::sync::broadcast;

/// A single settings change.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsChange {
    pub key: String,
    pub value: Option<Value>,
}

/// Key/value settings store with change notification.
pub trait SettingsStore: Send + Sync {
    /// Current value for `key`, falling back to the default when unset.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value and notify subscribers.
    fn set(&self, key: &str, value: Value);

    /// Subscribe to subsequent changes.
    fn subscribe(&self) -> broadcast::Receiver<SettingsChange>;
}
