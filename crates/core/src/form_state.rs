//! Form state for wizard steps and entity modals.
//!
//! Every step form reads and writes its fields through [`FormState`] rather
//! than a framework binding object. Paths are dotted (`category.value`,
//! `departments.0.label`); numeric segments index arrays.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::validation::FieldErrors;

/// Handle returned by [`FormState::subscribe`].
pub type SubscriptionId = u64;

type Listener = Box<dyn Fn(&str, &Value) + Send + Sync>;

/// Field values, field errors and change subscribers of one form.
#[derive(Default)]
pub struct FormState {
    values: Value,
    errors: FieldErrors,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl std::fmt::Debug for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormState")
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl FormState {
    pub fn new() -> Self {
        Self::from_values(Map::new())
    }

    /// Start from existing values, e.g. a restored draft.
    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            values: Value::Object(values),
            ..Self::default()
        }
    }

    /// Look up the value at `path`.
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        let mut current = &self.values;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at `path`, creating intermediate containers, clear any
    /// error recorded for that path and notify subscribers.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), CoreError> {
        if path.is_empty() {
            return Err(CoreError::Validation("Form path must not be empty".into()));
        }
        let segments: Vec<&str> = path.split('.').collect();
        set_at(&mut self.values, &segments, value.clone(), path)?;
        self.errors.remove(path);

        for (_, listener) in &self.listeners {
            listener(path, &value);
        }
        Ok(())
    }

    /// All values as a JSON object.
    pub fn values(&self) -> Map<String, Value> {
        match &self.values {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Run `schema` against the current values, remembering the errors.
    pub fn validate<F>(&mut self, schema: F) -> Result<(), FieldErrors>
    where
        F: Fn(&Value) -> Result<(), FieldErrors>,
    {
        match schema(&self.values) {
            Ok(()) => {
                self.errors.clear();
                Ok(())
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Error message shown inline next to `path`.
    pub fn error_for(&self, path: &str) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    /// Register a change callback invoked with `(path, new_value)`.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.next_subscription += 1;
        let id = self.next_subscription;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }
}

fn set_at(target: &mut Value, segments: &[&str], value: Value, path: &str) -> Result<(), CoreError> {
    let Some((segment, rest)) = segments.split_first() else {
        *target = value;
        return Ok(());
    };

    if target.is_null() {
        *target = if segment.parse::<usize>().is_ok() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }

    match target {
        Value::Object(map) => {
            let slot = map.entry(segment.to_string()).or_insert(Value::Null);
            set_at(slot, rest, value, path)
        }
        Value::Array(items) => {
            let index = segment.parse::<usize>().map_err(|_| {
                CoreError::Validation(format!("'{segment}' in '{path}' is not an array index"))
            })?;
            if index == items.len() {
                items.push(Value::Null);
            }
            let slot = items.get_mut(index).ok_or_else(|| {
                CoreError::Validation(format!("Index {index} in '{path}' is out of bounds"))
            })?;
            set_at(slot, rest, value, path)
        }
        _ => Err(CoreError::Validation(format!(
            "Cannot set '{path}': '{segment}' is below a scalar value"
        ))),
    }
}
