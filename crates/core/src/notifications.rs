//! User-visible notices.
//!
//! Backend failures are caught where the call is made and turned into a
//! transient notice; nothing propagates further. Validation errors are not
//! notices, they render inline through [`crate::form_state::FormState`].

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Shown for any mid-flight upload failure; the user restarts the upload.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

/// Shown when the backend rejects an account because the email is taken.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "This email address is already in use.";

/// Fallback when the backend sent no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Substrings the backend uses for duplicate-email conflicts.
const DUPLICATE_EMAIL_MARKERS: &[&str] = &["email already exists", "duplicate email", "email is already"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Sink for toast notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that records every notice, used by headless embeddings and
/// tests.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().ok().and_then(|n| n.last().cloned())
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .collect()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut notices) => notices.push(notice),
            Err(e) => tracing::warn!(error = %e, "Notice log lock poisoned, dropping notice"),
        }
    }
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Turn a backend error message into what the user sees.
pub fn describe_request_error(message: &str) -> String {
    let lowered = message.to_ascii_lowercase();
    if DUPLICATE_EMAIL_MARKERS.iter().any(|m| lowered.contains(m)) {
        return DUPLICATE_EMAIL_MESSAGE.to_string();
    }
    let trimmed = message.trim();
    if trimmed.is_empty() {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}
