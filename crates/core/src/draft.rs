//! Wizard draft persistence.
//!
//! A draft is the untyped, partial record a multi-step wizard accumulates
//! across steps. It is stored JSON-encoded in the [`DRAFT_STORAGE_KEY`] slot so
//! a reload mid-wizard restores it. The store knows nothing about which
//! entity the draft belongs to.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::storage::{TabStorage, DRAFT_STORAGE_KEY};

/// Accumulated wizard fields.
pub type Draft = Map<String, Value>;

/// Blind value cell over one storage slot.
#[derive(Debug, Clone)]
pub struct DraftStore<S> {
    storage: S,
}

impl<S: TabStorage> DraftStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read the persisted draft.
    ///
    /// Returns `None` when the slot is empty, unreadable, not valid JSON, or
    /// not a JSON object. Never errors.
    pub fn load(&self) -> Option<Draft> {
        let raw = match self.storage.get(DRAFT_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Draft slot unreadable, treating as empty");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(draft)) => Some(draft),
            Ok(other) => {
                tracing::warn!(kind = value_kind(&other), "Draft slot is not an object, ignoring");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Draft slot is not valid JSON, ignoring");
                None
            }
        }
    }

    /// Persist the full draft, replacing any previous value.
    pub fn save(&self, draft: &Draft) -> Result<(), CoreError> {
        let encoded = serde_json::to_string(draft)
            .map_err(|e| CoreError::Internal(format!("failed to encode draft: {e}")))?;
        self.storage.set(DRAFT_STORAGE_KEY, &encoded)
    }

    /// Remove the persisted draft.
    pub fn clear(&self) -> Result<(), CoreError> {
        self.storage.remove(DRAFT_STORAGE_KEY)
    }

    /// Shallow-merge `fields` into the current draft (creating it if absent),
    /// persist the result and return it.
    pub fn merge(&self, fields: &Draft) -> Result<Draft, CoreError> {
        let mut draft = self.load().unwrap_or_default();
        merge_shallow(&mut draft, fields);
        self.save(&draft)?;
        Ok(draft)
    }

    /// True if a decodable draft is present.
    pub fn exists(&self) -> bool {
        self.load().is_some()
    }
}

/// Overwrite top-level keys of `target` with those of `fields`.
pub fn merge_shallow(target: &mut Draft, fields: &Draft) {
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
