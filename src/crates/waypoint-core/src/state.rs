//! State schema and reducers
//!
//! A run's state is a JSON object whose fields are **declared up front** in a
//! [`StateSchema`]. Each field has a [`FieldKind`] (what values it may hold) and a
//! [`Reducer`] (how a node's partial update is merged into it). Declaring fields
//! turns key typos into errors instead of silently growing the state.
//!
//! | Reducer | Behavior | Use Case |
//! |---------|----------|----------|
//! | [`Reducer::Replace`] | Last write wins (default) | Drafts, decisions, feedback text |
//! | [`Reducer::Append`] | `old ++ new` | Message logs, review history |
//!
//! ```rust
//! use waypoint_core::state::{PartialUpdate, StateSchema};
//! use serde_json::json;
//!
//! let schema = StateSchema::new()
//!     .text("draft").unwrap()
//!     .sequence("messages").unwrap();
//!
//! let mut state = schema.initial_state();
//! schema
//!     .apply(&mut state, &PartialUpdate::new().set("draft", "v1").set("messages", json!(["hi"])))
//!     .unwrap();
//! schema
//!     .apply(&mut state, &PartialUpdate::new().set("messages", json!(["there"])))
//!     .unwrap();
//!
//! assert_eq!(state.get_str("draft"), Some("v1"));
//! assert_eq!(state.get("messages"), Some(&json!(["hi", "there"])));
//! ```
//!
//! # Presence
//!
//! A field that is absent or `null` is "not computed yet"; any other value,
//! including an empty string, counts as present. [`RunState::is_present`] is the
//! check nodes use to avoid recomputing work when they are re-entered.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Engine-reserved field that carries the external decision injected on resume
pub const DECISION_FIELD: &str = "__decision__";

/// Field names with this prefix belong to the engine
pub const RESERVED_PREFIX: &str = "__";

/// Errors raised by schema declaration, validation or reducer application
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// The field was never declared in the schema
    #[error("Unknown state field '{0}'")]
    UnknownField(String),

    /// Nodes may not declare or write engine fields
    #[error("Field '{0}' is reserved for the engine")]
    ReservedField(String),

    /// The field is declared twice
    #[error("Field '{0}' is declared twice")]
    DuplicateField(String),

    /// The value does not fit the field's kind
    #[error("Field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        actual: &'static str,
    },

    /// The reducer is not allowed for the field's kind
    #[error("Reducer '{reducer}' cannot be used on {kind} field '{field}'")]
    InvalidReducer {
        field: String,
        reducer: Reducer,
        kind: FieldKind,
    },

    /// The state as a whole is malformed
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// What a field may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Any JSON value
    Scalar,
    /// A string
    Text,
    /// A JSON array, usually an append-only log
    Sequence,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Scalar => "scalar",
            FieldKind::Text => "text",
            FieldKind::Sequence => "sequence",
        })
    }
}

/// Per-field merge policy, fixed when the schema is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// `reduce(old, new) = new`
    #[default]
    Replace,
    /// `reduce(old, new) = old ++ new`; a non-array update is appended as one item
    Append,
}

impl Reducer {
    /// Merge `update` into `current`
    ///
    /// Inputs are expected to have passed [`FieldSpec::check_update`].
    pub fn reduce(&self, current: Value, update: Value) -> Value {
        match self {
            Reducer::Replace => update,
            Reducer::Append => {
                let mut items = match current {
                    Value::Array(items) => items,
                    _ => Vec::new(),
                };
                match update {
                    Value::Array(new) => items.extend(new),
                    single => items.push(single),
                }
                Value::Array(items)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Replace => "replace",
            Reducer::Append => "append",
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declaration of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub reducer: Reducer,
}

impl FieldSpec {
    /// Check a stored value against the field's kind
    pub fn check_value(&self, field: &str, value: &Value) -> Result<(), StateError> {
        let ok = match (self.kind, value) {
            (_, Value::Null) => true,
            (FieldKind::Scalar, _) => true,
            (FieldKind::Text, Value::String(_)) => true,
            (FieldKind::Sequence, Value::Array(_)) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(self.mismatch(field, value))
        }
    }

    /// Check a value a node wants to merge into the field
    pub fn check_update(&self, field: &str, value: &Value) -> Result<(), StateError> {
        match self.reducer {
            Reducer::Replace => self.check_value(field, value),
            Reducer::Append if value.is_null() => Err(self.mismatch(field, value)),
            Reducer::Append => Ok(()),
        }
    }

    fn mismatch(&self, field: &str, value: &Value) -> StateError {
        StateError::TypeMismatch {
            field: field.to_string(),
            expected: self.kind,
            actual: json_type(value),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_reserved(field: &str) -> bool {
    field.starts_with(RESERVED_PREFIX)
}

/// Declared fields of a graph's state
///
/// The reserved [`DECISION_FIELD`] is always declared as a replace-reduced scalar.
#[derive(Debug, Clone)]
pub struct StateSchema {
    fields: BTreeMap<String, FieldSpec>,
}

impl Default for StateSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSchema {
    /// Create a schema holding only the engine's decision field
    pub fn new() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            DECISION_FIELD.to_string(),
            FieldSpec {
                kind: FieldKind::Scalar,
                reducer: Reducer::Replace,
            },
        );
        Self { fields }
    }

    /// Declare a field
    pub fn field(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        reducer: Reducer,
    ) -> Result<Self, StateError> {
        let name = name.into();
        if is_reserved(&name) {
            return Err(StateError::ReservedField(name));
        }
        if self.fields.contains_key(&name) {
            return Err(StateError::DuplicateField(name));
        }
        if reducer == Reducer::Append && kind != FieldKind::Sequence {
            return Err(StateError::InvalidReducer {
                field: name,
                reducer,
                kind,
            });
        }
        self.fields.insert(name, FieldSpec { kind, reducer });
        Ok(self)
    }

    /// Declare a replace-reduced text field
    pub fn text(self, name: impl Into<String>) -> Result<Self, StateError> {
        self.field(name, FieldKind::Text, Reducer::Replace)
    }

    /// Declare a replace-reduced field holding any JSON value
    pub fn scalar(self, name: impl Into<String>) -> Result<Self, StateError> {
        self.field(name, FieldKind::Scalar, Reducer::Replace)
    }

    /// Declare an append-only sequence
    pub fn sequence(self, name: impl Into<String>) -> Result<Self, StateError> {
        self.field(name, FieldKind::Sequence, Reducer::Append)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Declared fields in name order, engine fields included
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// State with every declared field unset; sequences start empty
    pub fn initial_state(&self) -> RunState {
        let map = self
            .fields
            .iter()
            .map(|(name, spec)| {
                let value = match spec.kind {
                    FieldKind::Sequence => Value::Array(Vec::new()),
                    _ => Value::Null,
                };
                (name.clone(), value)
            })
            .collect();
        RunState(map)
    }

    /// Check that every field of `state` is declared and holds a value of its kind
    pub fn validate(&self, state: &RunState) -> Result<(), StateError> {
        for (field, value) in state.iter() {
            let spec = self
                .fields
                .get(field)
                .ok_or_else(|| StateError::UnknownField(field.clone()))?;
            spec.check_value(field, value)?;
        }
        Ok(())
    }

    /// Validate `state` and fill in any declared field it leaves out
    ///
    /// Used for initial states, so a decision may not be pre-loaded; only a
    /// resume delivers one.
    pub fn complete(&self, state: RunState) -> Result<RunState, StateError> {
        if state.decision().is_some() {
            return Err(StateError::ReservedField(DECISION_FIELD.to_string()));
        }
        self.validate(&state)?;
        let mut full = self.initial_state();
        for (field, value) in state.0 {
            full.0.insert(field, value);
        }
        Ok(full)
    }

    /// Merge a node's partial update into `state`
    ///
    /// The whole update is validated before anything is written, so a rejected
    /// update leaves `state` untouched.
    pub fn apply(&self, state: &mut RunState, update: &PartialUpdate) -> Result<(), StateError> {
        for (field, value) in update.iter() {
            if is_reserved(field) {
                return Err(StateError::ReservedField(field.clone()));
            }
            let spec = self
                .fields
                .get(field)
                .ok_or_else(|| StateError::UnknownField(field.clone()))?;
            spec.check_update(field, value)?;
        }

        for (field, value) in update.iter() {
            let spec = &self.fields[field];
            let slot = state.0.entry(field.clone()).or_insert(Value::Null);
            let current = std::mem::take(slot);
            *slot = spec.reducer.reduce(current, value.clone());
        }
        Ok(())
    }
}

/// The shared record a run's nodes read and update
///
/// Nodes receive a snapshot by value; the engine is the only writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunState(Map<String, Value>);

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build state from a JSON object
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StateError::InvalidState(format!(
                "state must be a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Builder-style setter for initial states
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Value of a present field; absent and `null` fields yield `None`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_array(&self, field: &str) -> Option<&[Value]> {
        self.get(field).and_then(Value::as_array).map(Vec::as_slice)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Deserialize a present field into `T`
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, StateError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| StateError::InvalidState(format!("field '{}': {}", field, e))),
        }
    }

    /// Whether the field holds a computed value
    pub fn is_present(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// The external decision injected by the last resume, if any
    pub fn decision(&self) -> Option<&Value> {
        self.get(DECISION_FIELD)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub(crate) fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }
}

impl From<Map<String, Value>> for RunState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The fields a node intends to touch, merged by each field's reducer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialUpdate(Map<String, Value>);

impl PartialUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Build an update from a JSON object
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StateError::InvalidState(format!(
                "partial update must be a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for PartialUpdate {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for PartialUpdate {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
