use std::path::PathBuf;
use std::time::Duration;

use campus_core::upload::DEFAULT_CHUNK_SIZE;

use crate::error::{ClientError, ClientResult};

/// Console client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a
/// backend on `localhost:8000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    pub request_timeout_secs: u64,
    /// Multipart upload part size in bytes.
    pub upload_chunk_bytes: u64,
    /// Delay between the last keystroke and the search request.
    pub search_debounce_ms: u64,
    /// Directory backing the tab-local storage slots.
    pub storage_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api/v1".into(),
            request_timeout_secs: 30,
            upload_chunk_bytes: DEFAULT_CHUNK_SIZE,
            search_debounce_ms: 500,
            storage_dir: PathBuf::from(".campus"),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment (and `.env`, if present).
    ///
    /// | Env Var                       | Default                        |
    /// |-------------------------------|--------------------------------|
    /// | `CAMPUS_API_URL`              | `http://localhost:8000/api/v1` |
    /// | `CAMPUS_REQUEST_TIMEOUT_SECS` | `30`                           |
    /// | `CAMPUS_UPLOAD_CHUNK_BYTES`   | `5242880`                      |
    /// | `CAMPUS_SEARCH_DEBOUNCE_MS`   | `500`                          |
    /// | `CAMPUS_STORAGE_DIR`          | `.campus`                      |
    pub fn from_env() -> ClientResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("CAMPUS_API_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "CAMPUS_API_URL must be an http(s) URL, got '{api_url}'"
            )));
        }

        let request_timeout_secs =
            parse_var(&lookup, "CAMPUS_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;
        let upload_chunk_bytes =
            parse_var(&lookup, "CAMPUS_UPLOAD_CHUNK_BYTES", defaults.upload_chunk_bytes)?;
        if upload_chunk_bytes == 0 {
            return Err(ClientError::Config("CAMPUS_UPLOAD_CHUNK_BYTES must be positive".into()));
        }
        let search_debounce_ms =
            parse_var(&lookup, "CAMPUS_SEARCH_DEBOUNCE_MS", defaults.search_debounce_ms)?;
        let storage_dir = lookup("CAMPUS_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        Ok(Self {
            api_url,
            request_timeout_secs,
            upload_chunk_bytes,
            search_debounce_ms,
            storage_dir,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

fn parse_var<F>(lookup: &F, key: &str, default: u64) -> ClientResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClientError::Config(format!("{key} must be a non-negative integer, got '{raw}'"))),
        None => Ok(default),
    }
}
