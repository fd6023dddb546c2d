//! Shared fixtures for use case tests: in-memory settings, a recording
//! notifier, and document source builders.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::infrastructure::ports::{Notice, NoticeLevel, NotificationPort, RepoError, SettingsRepo};

/// Settings held in a map.
#[derive(Default)]
pub struct InMemorySettingsRepo {
    values: Mutex<HashMap<String, Value>>,
}

impl InMemorySettingsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: Value) -> Self {
        self.values
            .lock()
            .expect("settings lock")
            .insert(key.to_string(), value);
        self
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.lock().expect("settings lock").get(key).cloned()
    }
}

#[async_trait]
impl SettingsRepo for InMemorySettingsRepo {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepoError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), RepoError> {
        self.values
            .lock()
            .expect("settings lock")
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Keeps every notice for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notices lock").clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices().iter().filter(|n| n.level == level).count()
    }
}

impl NotificationPort for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("notices lock").push(notice);
    }
}

// =============================================================================
// Document Sources
// =============================================================================

pub fn player(name: &str) -> Value {
    json!({"name": name, "type": "Player", "system": {}})
}

/// A lit torch with `remaining_secs` of fuel left.
pub fn lit_torch(remaining_secs: f64) -> Value {
    json!({
        "name": "Torch",
        "type": "Basic",
        "system": {
            "light": {
                "isSource": true,
                "active": true,
                "longevity": 60,
                "remainingSecs": remaining_secs,
                "template": "torch"
            }
        }
    })
}

pub fn unlit_torch() -> Value {
    json!({
        "name": "Torch",
        "type": "Basic",
        "system": {"light": {"isSource": true, "active": false, "longevity": 60}}
    })
}

/// An Effect item with the given duration and start.
pub fn effect(name: &str, unit: &str, value: f64, start: Value) -> Value {
    json!({
        "name": name,
        "type": "Effect",
        "system": {
            "duration": {"type": unit, "value": value},
            "start": start
        }
    })
}
