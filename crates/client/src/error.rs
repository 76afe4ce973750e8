use campus_core::error::CoreError;
use campus_core::notifications::{describe_request_error, GENERIC_ERROR_MESSAGE, UPLOAD_FAILED_MESSAGE};
use campus_core::upload::UploadError;
use campus_core::validation::FieldErrors;

/// Errors surfaced by the console controllers and the REST client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        /// `error` field of the `{ "error", "code" }` body, or the raw body.
        message: String,
        code: Option<String>,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Client-side validation failed; nothing was sent.
    #[error("{} field(s) failed validation", .0.len())]
    FieldErrors(FieldErrors),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Text for the toast shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => describe_request_error(message),
            Self::Upload(e) if e.is_preflight() => e.to_string(),
            Self::Upload(_) => UPLOAD_FAILED_MESSAGE.to_string(),
            Self::Request(_) | Self::Decode(_) => GENERIC_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}
