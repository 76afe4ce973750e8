//! Campus admin console core.
//!
//! Pure, synchronous building blocks shared by the async controllers in
//! `campus-client`: tab-local storage and the wizard draft, form state and
//! validation schemas, the wizard step registry, the module/lesson content
//! tree, list-page query state, and upload planning.

pub mod content_tree;
pub mod draft;
pub mod entities;
pub mod error;
pub mod form_state;
pub mod list_query;
pub mod location;
pub mod notifications;
pub mod quiz_import;
pub mod session;
pub mod storage;
pub mod types;
pub mod upload;
pub mod validation;
pub mod wizard;
