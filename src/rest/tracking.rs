//! Dirty tracking for partial updates.
//!
//! This module provides [`TrackedValues`], the field store behind every
//! [`Resource`](crate::rest::Resource). It holds one wire value per declared
//! field and remembers which fields were written locally since the last
//! load or save, so a save sends only those.
//!
//! # How It Works
//!
//! Loading a wire object fills every declared field, falling back to the
//! field's default for missing keys, and clears the dirty set. Every write
//! marks its field dirty, even when the value is unchanged. After a
//! successful save the dirty set is cleared with [`TrackedValues::mark_clean`].
//!
//! # Example
//!
//! ```rust
//! use varda_client::rest::{Field, FieldKind, TrackedValues};
//! use serde_json::json;
//!
//! const FIELDS: &[Field] = &[
//!     Field::new("uri", FieldKind::String),
//!     Field::new("name", FieldKind::String).mutable(),
//! ];
//!
//! let mut tracked = TrackedValues::load(FIELDS, &json!({"uri": "/groups/1", "name": "lab"}));
//! assert!(!tracked.is_dirty());
//!
//! tracked.write("name", json!("lab"));
//! assert!(tracked.is_dirty());
//! assert_eq!(tracked.changed_fields(), json!({"name": "lab"}));
//!
//! tracked.mark_clean();
//! assert!(!tracked.is_dirty());
//! ```

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use crate::rest::fields::Field;

/// Wire values of a resource's declared fields, with dirty tracking.
#[derive(Debug, Clone)]
pub struct TrackedValues {
    fields: &'static [Field],
    values: HashMap<&'static str, Value>,
    dirty: BTreeSet<&'static str>,
}

impl TrackedValues {
    /// Loads the values of `fields` from a wire object.
    ///
    /// Keys missing from `wire` take the field default. Values for keys not
    /// declared in `fields` are ignored.
    #[must_use]
    pub fn load(fields: &'static [Field], wire: &Value) -> Self {
        let mut tracked = Self {
            fields,
            values: HashMap::new(),
            dirty: BTreeSet::new(),
        };
        tracked.reload(wire, false);
        tracked
    }

    /// Replaces the stored values with those in `wire`.
    ///
    /// With `skip_dirty`, dirty fields keep their local value and stay
    /// dirty; otherwise every field is overwritten and the dirty set is
    /// cleared.
    pub fn reload(&mut self, wire: &Value, skip_dirty: bool) {
        for field in self.fields {
            if skip_dirty && self.dirty.contains(field.name) {
                continue;
            }
            let value = wire
                .get(field.key)
                .cloned()
                .unwrap_or_else(|| field.default.to_value());
            self.values.insert(field.name, value);
        }
        if !skip_dirty {
            self.dirty.clear();
        }
    }

    /// Returns the stored wire value of a field.
    #[must_use]
    pub fn read(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Stores a wire value and marks the field dirty.
    ///
    /// Returns `false`, storing nothing, if `name` is not a declared field.
    pub fn write(&mut self, name: &str, value: Value) -> bool {
        let Some(field) = self.fields.iter().find(|field| field.name == name) else {
            return false;
        };
        self.values.insert(field.name, value);
        self.dirty.insert(field.name);
        true
    }

    /// Returns `true` if any field was written since the last load or save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Returns the names of the dirty fields, sorted.
    #[must_use]
    pub fn dirty_fields(&self) -> Vec<&'static str> {
        self.dirty.iter().copied().collect()
    }

    /// Returns the dirty fields as a wire object keyed by wire key.
    #[must_use]
    pub fn changed_fields(&self) -> Value {
        let mut changes = Map::new();
        for field in self.fields {
            if self.dirty.contains(field.name) {
                let value = self.values.get(field.name).cloned().unwrap_or(Value::Null);
                changes.insert(field.key.to_string(), value);
            }
        }
        Value::Object(changes)
    }

    /// Clears the dirty set.
    ///
    /// Call this after a successful save.
    pub fn mark_clean(&mut self) {
        self.dirty.clear();
    }

    /// Returns all stored values as a wire object keyed by wire key.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let mut object = Map::new();
        for field in self.fields {
            let value = self.values.get(field.name).cloned().unwrap_or(Value::Null);
            object.insert(field.key.to_string(), value);
        }
        Value::Object(object)
    }
}
