//! Shared helpers for client integration tests: an in-memory backend that
//! records every call and can be told to fail specific operations.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use campus_client::api::{ContentApi, EntityApi, ListApi, RecordApi, StorageApi};
use campus_client::error::{ClientError, ClientResult};
use campus_core::content_tree::{Lesson, LessonBody, Module, NewLesson, NewModule};
use campus_core::draft::DraftStore;
use campus_core::entities::Statistics;
use campus_core::list_query::{ListQuery, Paginated, PaginationMeta, Resource};
use campus_core::notifications::NoticeLog;
use campus_core::storage::MemoryStorage;
use campus_core::types::DbId;
use campus_core::upload::{CompleteUpload, InitiatedUpload};
use campus_core::wizard::WizardKind;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateEntity(WizardKind, Value),
    UpdateEntity(WizardKind, DbId, Value),
    GetEntity(WizardKind, DbId),
    ListModules(DbId),
    CreateModule(NewModule),
    DeleteModule(DbId),
    CreateLesson(NewLesson),
    UpdateLesson(Lesson),
    DeleteLesson(DbId),
    InitiateUpload(String),
    PresignPart(u32),
    PutPart(String, usize),
    CompleteUpload(CompleteUpload),
    QueryPage(Resource, ListQuery),
    DeleteMany(Resource, Vec<DbId>),
    Statistics,
    CreateRecord(Resource, Value),
    UpdateRecord(Resource, DbId, Value),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
    failure_message: Option<String>,
    next_id: DbId,
    entities: HashMap<(WizardKind, DbId), Value>,
    modules: Vec<Module>,
    rows: Vec<Value>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make every call to `op` fail with a 500 until [`heal`](Self::heal).
    pub fn fail(&self, op: &'static str) {
        self.state().failing.insert(op);
    }

    /// Fail `op` with a specific backend message.
    pub fn fail_with(&self, op: &'static str, message: &str) {
        let mut state = self.state();
        state.failing.insert(op);
        state.failure_message = Some(message.to_string());
    }

    pub fn heal(&self, op: &'static str) {
        self.state().failing.remove(op);
    }

    pub fn seed_entity(&self, kind: WizardKind, id: DbId, detail: Value) {
        self.state().entities.insert((kind, id), detail);
    }

    pub fn entity(&self, kind: WizardKind, id: DbId) -> Option<Value> {
        self.state().entities.get(&(kind, id)).cloned()
    }

    pub fn seed_modules(&self, modules: Vec<Module>) {
        let mut state = self.state();
        let max_id = modules
            .iter()
            .flat_map(|m| std::iter::once(m.id).chain(m.lessons.iter().map(|l| l.id)))
            .max()
            .unwrap_or(0);
        state.next_id = state.next_id.max(max_id);
        state.modules = modules;
    }

    pub fn seed_rows(&self, rows: Vec<Value>) {
        self.state().rows = rows;
    }

    pub fn rows(&self) -> Vec<Value> {
        self.state().rows.clone()
    }

    /// Record `call`, then fail if `op` is marked failing.
    fn record(&self, op: &'static str, call: Call) -> ClientResult<()> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing.contains(op) {
            let message = state
                .failure_message
                .clone()
                .unwrap_or_else(|| format!("{op} failed"));
            return Err(ClientError::Api {
                status: 500,
                message,
                code: Some("INTERNAL_ERROR".into()),
            });
        }
        Ok(())
    }

    fn next_id(&self) -> DbId {
        let mut state = self.state();
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl EntityApi for FakeBackend {
    async fn create_entity(&self, kind: WizardKind, body: &Value) -> ClientResult<DbId> {
        self.record("create_entity", Call::CreateEntity(kind, body.clone()))?;
        let id = self.next_id();
        self.state().entities.insert((kind, id), body.clone());
        Ok(id)
    }

    async fn update_entity(&self, kind: WizardKind, id: DbId, body: &Value) -> ClientResult<()> {
        self.record("update_entity", Call::UpdateEntity(kind, id, body.clone()))?;
        self.state().entities.insert((kind, id), body.clone());
        Ok(())
    }

    async fn get_entity(&self, kind: WizardKind, id: DbId) -> ClientResult<Value> {
        self.record("get_entity", Call::GetEntity(kind, id))?;
        self.entity(kind, id).ok_or(ClientError::Api {
            status: 404,
            message: format!("{} not found", kind.entity()),
            code: Some("NOT_FOUND".into()),
        })
    }
}

#[async_trait]
impl ContentApi for FakeBackend {
    async fn list_modules(&self, course_id: DbId) -> ClientResult<Vec<Module>> {
        self.record("list_modules", Call::ListModules(course_id))?;
        Ok(self
            .state()
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn create_module(&self, module: &NewModule) -> ClientResult<Module> {
        self.record("create_module", Call::CreateModule(module.clone()))?;
        let created = Module {
            id: self.next_id(),
            title: module.title.clone(),
            description: module.description.clone(),
            course_id: module.course_id,
            ordered_number: module.ordered_number,
            lessons: Vec::new(),
        };
        self.state().modules.push(created.clone());
        Ok(created)
    }

    async fn delete_module(&self, id: DbId) -> ClientResult<()> {
        self.record("delete_module", Call::DeleteModule(id))?;
        self.state().modules.retain(|m| m.id != id);
        Ok(())
    }

    async fn create_lesson(&self, lesson: &NewLesson) -> ClientResult<Lesson> {
        self.record("create_lesson", Call::CreateLesson(lesson.clone()))?;
        Ok(Lesson {
            id: self.next_id(),
            title: lesson.title.clone(),
            duration: 0,
            content: String::new(),
            index: lesson.index,
            module_id: lesson.module_id,
            body: LessonBody::empty(lesson.lesson_type),
        })
    }

    async fn update_lesson(&self, lesson: &Lesson) -> ClientResult<Lesson> {
        self.record("update_lesson", Call::UpdateLesson(lesson.clone()))?;
        Ok(lesson.clone())
    }

    async fn delete_lesson(&self, id: DbId) -> ClientResult<()> {
        self.record("delete_lesson", Call::DeleteLesson(id))
    }
}

#[async_trait]
impl StorageApi for FakeBackend {
    async fn initiate_upload(&self, file_name: &str, _content_type: &str) -> ClientResult<InitiatedUpload> {
        self.record("initiate_upload", Call::InitiateUpload(file_name.to_string()))?;
        Ok(InitiatedUpload {
            upload_id: "upload-1".into(),
            file_name: file_name.to_string(),
        })
    }

    async fn presign_part(&self, file_name: &str, upload_id: &str, part_number: u32) -> ClientResult<String> {
        self.record("presign_part", Call::PresignPart(part_number))?;
        Ok(format!(
            "https://storage.test/{file_name}?partNumber={part_number}&uploadId={upload_id}"
        ))
    }

    async fn put_part(&self, url: &str, bytes: Vec<u8>) -> ClientResult<String> {
        self.record("put_part", Call::PutPart(url.to_string(), bytes.len()))?;
        let part = url
            .split("partNumber=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap_or("?");
        Ok(format!("\"etag-{part}\""))
    }

    async fn complete_upload(&self, request: &CompleteUpload) -> ClientResult<String> {
        self.record("complete_upload", Call::CompleteUpload(request.clone()))?;
        Ok(format!("https://cdn.test/{}", request.file_name))
    }
}

#[async_trait]
impl ListApi for FakeBackend {
    async fn query_page(&self, resource: Resource, query: &ListQuery) -> ClientResult<Paginated<Value>> {
        self.record("query_page", Call::QueryPage(resource, query.clone()))?;
        let rows = self.rows();

        let matching: Vec<Value> = rows
            .into_iter()
            .filter(|row| match &query.q {
                Some(q) => row["name"]
                    .as_str()
                    .is_some_and(|n| n.to_lowercase().contains(&q.to_lowercase())),
                None => true,
            })
            .filter(|row| {
                query.filters.iter().all(|(group, values)| {
                    row[group.as_str()]
                        .as_str()
                        .is_some_and(|v| values.iter().any(|s| s == v))
                })
            })
            .collect();

        let limit = query.limit.max(1) as usize;
        let total = matching.len();
        let total_pages = total.div_ceil(limit).max(1);
        let start = (query.page.max(1) as usize - 1) * limit;
        let data = matching.into_iter().skip(start).take(limit).collect();

        Ok(Paginated {
            data,
            pagination: PaginationMeta {
                page_index: query.page,
                total_pages_count: total_pages as u32,
                page_size: query.limit,
                total_items_count: total as u64,
            },
        })
    }

    async fn delete_many(&self, resource: Resource, ids: &[DbId]) -> ClientResult<()> {
        self.record("delete_many", Call::DeleteMany(resource, ids.to_vec()))?;
        self.state()
            .rows
            .retain(|row| !row["id"].as_i64().is_some_and(|id| ids.contains(&id)));
        Ok(())
    }

    async fn statistics(&self) -> ClientResult<Statistics> {
        self.record("statistics", Call::Statistics)?;
        Ok(Statistics {
            total_accounts: self.state().rows.len() as i64,
            ..Statistics::default()
        })
    }
}

#[async_trait]
impl RecordApi for FakeBackend {
    async fn create_record(&self, resource: Resource, body: &Value) -> ClientResult<Value> {
        self.record("create_record", Call::CreateRecord(resource, body.clone()))?;
        let mut record = body.clone();
        record["id"] = json!(self.next_id());
        Ok(record)
    }

    async fn update_record(&self, resource: Resource, id: DbId, body: &Value) -> ClientResult<Value> {
        self.record("update_record", Call::UpdateRecord(resource, id, body.clone()))?;
        let mut record = body.clone();
        record["id"] = json!(id);
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn notices() -> Arc<NoticeLog> {
    Arc::new(NoticeLog::new())
}

/// A draft store plus a handle on its storage, so a test can build a second
/// store over the same slot to simulate a reload.
pub fn draft_store() -> (Arc<MemoryStorage>, DraftStore<Arc<MemoryStorage>>) {
    let storage = Arc::new(MemoryStorage::new());
    (storage.clone(), DraftStore::new(storage))
}

pub fn object(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
