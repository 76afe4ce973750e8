//! Campus admin console client.
//!
//! Async controllers for the wizards, the course content editor, chunked
//! media uploads, list pages and entity modals, plus the `reqwest`
//! implementation of the REST API seams they talk to.

pub mod api;
pub mod config;
pub mod content_editor;
pub mod debounce;
pub mod error;
pub mod http;
pub mod list_page;
pub mod modal;
pub mod uploader;
pub mod wizard;
