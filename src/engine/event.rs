// SPDX-License-Identifier: MIT

//! Event records as submitted, and their typed form used for evaluation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::registry::FieldRegistry;
use super::value::TypedValue;

/// Raw event data: field name to JSON value
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EventRecord {
    fields: Map<String, Value>,
}

impl EventRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object; any other JSON value yields `None`
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a nested value using dot notation (e.g., "venue.building").
    /// A top-level key containing dots wins over the nested lookup.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }

        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }
}

/// What ingestion found for a registered field
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(TypedValue),
    /// Present in the record but not representable as the field's type
    Uncoercible(Value),
}

/// An event whose registered fields have been coerced once, up front
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedEvent {
    slots: HashMap<String, Slot>,
}

impl TypedEvent {
    /// Coerce every active registry field present in `record`. Fields the
    /// registry does not know are dropped; absent fields stay absent.
    pub fn ingest(record: &EventRecord, registry: &FieldRegistry) -> Self {
        let mut slots = HashMap::new();
        for def in registry.active_fields() {
            let Some(raw) = record.get_path(&def.name) else {
                continue;
            };
            let slot = match TypedValue::coerce(raw, def.field_type) {
                Some(value) => Slot::Value(value),
                None => {
                    log::debug!(
                        "Event field '{}' ({}) could not be coerced from {}",
                        def.name,
                        def.field_type,
                        raw
                    );
                    Slot::Uncoercible(raw.clone())
                }
            };
            slots.insert(def.name.clone(), slot);
        }
        Self { slots }
    }

    pub fn slot(&self, field: &str) -> Option<&Slot> {
        self.slots.get(field)
    }

    pub fn value(&self, field: &str) -> Option<&TypedValue> {
        match self.slots.get(field) {
            Some(Slot::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::{FieldDefinition, FieldType};
    use serde_json::json;

    fn registry() -> FieldRegistry {
        FieldRegistry::with_fields(vec![
            FieldDefinition::new("location", FieldType::String),
            FieldDefinition::new("expectedAttendance", FieldType::Number),
            FieldDefinition::new("venue.building", FieldType::String),
            FieldDefinition::new("retired", FieldType::Boolean)
                .inactive(),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_json_requires_object() {
        assert!(EventRecord::from_json(json!({"a": 1})).is_some());
        assert!(EventRecord::from_json(json!([1, 2])).is_none());
        assert!(EventRecord::from_json(json!("event")).is_none());
    }

    #[test]
    fn test_get_path() {
        let venue = json!({"building": "Union", "floor": {"number": 2}});
        let record = EventRecord::new()
            .with("venue", venue)
            .with("a.b", json!("flat"));

        assert_eq!(record.get_path("venue.building"), Some(&json!("Union")));
        assert_eq!(record.get_path("venue.floor.number"), Some(&json!(2)));
        assert_eq!(record.get_path("venue.room"), None);
        assert_eq!(record.get_path("a.b"), Some(&json!("flat")));
    }

    #[test]
    fn test_ingest_coerces_registered_fields() {
        let record = EventRecord::new()
            .with("location", json!("DCC 308"))
            .with("expectedAttendance", json!("120"))
            .with("venue", json!({"building": "Union"}))
            .with("unregistered", json!("ignored"));
        let event = TypedEvent::ingest(&record, &registry());

        assert_eq!(event.len(), 3);
        assert_eq!(
            event.value("expectedAttendance"),
            Some(&TypedValue::Number(120.0))
        );
        assert_eq!(
            event.value("venue.building"),
            Some(&TypedValue::Str("Union".to_string()))
        );
        assert!(event.slot("unregistered").is_none());
    }

    #[test]
    fn test_ingest_marks_uncoercible_and_skips_inactive() {
        let record = EventRecord::new()
            .with("expectedAttendance", json!("a few"))
            .with("retired", json!(true));
        let event = TypedEvent::ingest(&record, &registry());

        assert_eq!(
            event.slot("expectedAttendance"),
            Some(&Slot::Uncoercible(json!("a few")))
        );
        assert_eq!(event.value("expectedAttendance"), None);
        assert!(event.slot("retired").is_none());
    }
}
