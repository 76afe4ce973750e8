//! REST API seams consumed by the controllers.
//!
//! Each trait covers one group of backend resources. [`crate::http::HttpApi`]
//! implements all of them over HTTP; tests substitute in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use campus_core::content_tree::{Lesson, Module, NewLesson, NewModule};
use campus_core::entities::Statistics;
use campus_core::list_query::{ListQuery, Paginated, Resource};
use campus_core::types::DbId;
use campus_core::upload::{CompleteUpload, InitiatedUpload};
use campus_core::wizard::WizardKind;

use crate::error::ClientResult;

/// Courses and challenges built by the wizards.
#[async_trait]
pub trait EntityApi: Send + Sync {
    /// Create the entity and return its backend id.
    async fn create_entity(&self, kind: WizardKind, body: &Value) -> ClientResult<DbId>;

    async fn update_entity(&self, kind: WizardKind, id: DbId, body: &Value) -> ClientResult<()>;

    /// Full detail, used to seed the draft in edit mode.
    async fn get_entity(&self, kind: WizardKind, id: DbId) -> ClientResult<Value>;
}

/// Modules and lessons of a course.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn list_modules(&self, course_id: DbId) -> ClientResult<Vec<Module>>;

    async fn create_module(&self, module: &NewModule) -> ClientResult<Module>;

    async fn delete_module(&self, id: DbId) -> ClientResult<()>;

    async fn create_lesson(&self, lesson: &NewLesson) -> ClientResult<Lesson>;

    /// Save a lesson's title, content and type-specific payload.
    async fn update_lesson(&self, lesson: &Lesson) -> ClientResult<Lesson>;

    async fn delete_lesson(&self, id: DbId) -> ClientResult<()>;
}

/// Three-phase multipart upload to object storage.
#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn initiate_upload(&self, file_name: &str, content_type: &str) -> ClientResult<InitiatedUpload>;

    /// Presigned URL for one part.
    async fn presign_part(&self, file_name: &str, upload_id: &str, part_number: u32) -> ClientResult<String>;

    /// PUT one chunk to a presigned URL and return the part's ETag.
    async fn put_part(&self, url: &str, bytes: Vec<u8>) -> ClientResult<String>;

    /// Finalize the object and return its public URL.
    async fn complete_upload(&self, request: &CompleteUpload) -> ClientResult<String>;
}

/// Paginated collections behind the list pages.
#[async_trait]
pub trait ListApi: Send + Sync {
    async fn query_page(&self, resource: Resource, query: &ListQuery) -> ClientResult<Paginated<Value>>;

    async fn delete_many(&self, resource: Resource, ids: &[DbId]) -> ClientResult<()>;

    async fn statistics(&self) -> ClientResult<Statistics>;
}

/// Simple entities edited in modals (accounts, departments, categories).
#[async_trait]
pub trait RecordApi: Send + Sync {
    async fn create_record(&self, resource: Resource, body: &Value) -> ClientResult<Value>;

    async fn update_record(&self, resource: Resource, id: DbId, body: &Value) -> ClientResult<Value>;
}
