//! Partial document updates keyed by dotted paths.
//!
//! Keys follow the host convention: `"system.light.remainingSecs"` addresses a
//! nested field, and a final segment prefixed with `-=` deletes that field.
//! Object values are merged into existing objects rather than replacing them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DELETE_PREFIX: &str = "-=";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialUpdate(Map<String, Value>);

impl PartialUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Set `path` to `value`.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(path.into(), value.into());
        self
    }

    /// Builder form of [`PartialUpdate::set`].
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(path, value);
        self
    }

    /// Mark the field at `path` for deletion.
    pub fn unset(&mut self, path: &str) -> &mut Self {
        let key = match path.rsplit_once('.') {
            Some((parent, leaf)) => format!("{parent}.{DELETE_PREFIX}{leaf}"),
            None => format!("{DELETE_PREFIX}{path}"),
        };
        self.0.insert(key, Value::Null);
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Fold another update into this one; later keys win.
    pub fn merge(&mut self, other: PartialUpdate) {
        self.0.extend(other.0);
    }

    /// Apply every path in this update to `target`, creating intermediate
    /// objects as needed. Non-object intermediates are replaced.
    pub fn apply_to(&self, target: &mut Value) {
        for (path, value) in &self.0 {
            apply_path(target, path, value);
        }
    }
}

impl From<Map<String, Value>> for PartialUpdate {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn apply_path(target: &mut Value, path: &str, value: &Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut cursor = target;
    for segment in segments {
        cursor = child_object(cursor, segment);
    }

    if !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    let Value::Object(map) = cursor else {
        return;
    };

    if let Some(removed) = leaf.strip_prefix(DELETE_PREFIX) {
        map.remove(removed);
        return;
    }

    match map.get_mut(leaf) {
        Some(existing) if existing.is_object() && value.is_object() => {
            merge_values(existing, value)
        }
        _ => {
            map.insert(leaf.to_string(), value.clone());
        }
    }
}

fn child_object<'a>(cursor: &'a mut Value, segment: &str) -> &'a mut Value {
    if !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    match cursor {
        Value::Object(map) => {
            let child = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            child
        }
        other => other,
    }
}

fn merge_values(existing: &mut Value, incoming: &Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(updates)) => {
            for (key, value) in updates {
                if let Some(removed) = key.strip_prefix(DELETE_PREFIX) {
                    current.remove(removed);
                    continue;
                }
                match current.get_mut(key) {
                    Some(slot) if slot.is_object() && value.is_object() => {
                        merge_values(slot, value)
                    }
                    _ => {
                        current.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sets_nested_paths() {
        let mut doc = json!({"name": "Torch", "system": {"light": {"remainingSecs": 3600}}});
        PartialUpdate::new()
            .with("system.light.remainingSecs", 3540)
            .apply_to(&mut doc);
        assert_eq!(doc["system"]["light"]["remainingSecs"], json!(3540));
        assert_eq!(doc["name"], json!("Torch"));
    }

    #[test]
    fn creates_missing_intermediates() {
        let mut doc = json!({"system": {}});
        PartialUpdate::new()
            .with("system.start.combatTime", json!({"round": 1, "turn": 0}))
            .apply_to(&mut doc);
        assert_eq!(doc["system"]["start"]["combatTime"]["round"], json!(1));
    }

    #[test]
    fn deletes_with_prefixed_leaf() {
        let mut doc = json!({"system": {"legacy": true, "kept": 1}});
        let mut update = PartialUpdate::new();
        update.unset("system.legacy");
        assert!(update.get("system.-=legacy").is_some());
        update.apply_to(&mut doc);
        assert_eq!(doc, json!({"system": {"kept": 1}}));
    }

    #[test]
    fn merges_object_values() {
        let mut doc = json!({"system": {"light": {"active": true, "remainingSecs": 10}}});
        PartialUpdate::new()
            .with("system.light", json!({"remainingSecs": 5}))
            .apply_to(&mut doc);
        assert_eq!(doc["system"]["light"], json!({"active": true, "remainingSecs": 5}));
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let mut doc = json!({"a": 1});
        let update = PartialUpdate::new();
        assert!(update.is_empty());
        update.apply_to(&mut doc);
        assert_eq!(doc, json!({"a": 1}));
    }
}
