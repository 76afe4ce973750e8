//! Signed-in user profile slot.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::storage::{TabStorage, SESSION_STORAGE_KEY};
use crate::types::DbId;

/// Profile of the signed-in administrator as handed over by the login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    pub user_id: DbId,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    storage: S,
}

impl<S: TabStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// `None` when absent or undecodable.
    pub fn load(&self) -> Option<SessionProfile> {
        let raw = self.storage.get(SESSION_STORAGE_KEY).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Session slot is not a valid profile, ignoring");
                None
            }
        }
    }

    pub fn save(&self, profile: &SessionProfile) -> Result<(), CoreError> {
        let encoded = serde_json::to_string(profile)
            .map_err(|e| CoreError::Internal(format!("failed to encode session: {e}")))?;
        self.storage.set(SESSION_STORAGE_KEY, &encoded)
    }

    pub fn clear(&self) -> Result<(), CoreError> {
        self.storage.remove(SESSION_STORAGE_KEY)
    }

    /// Bearer token of the current session, if any.
    pub fn access_token(&self) -> Option<String> {
        self.load().map(|p| p.access_token)
    }
}
