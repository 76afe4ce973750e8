//! REST client for the campus backend.
//!
//! Wraps every API seam in [`crate::api`] with [`reqwest`]. Successful
//! responses carry a `{ "data": ... }` envelope (list pages add
//! `pagination`); failures carry `{ "error": message, "code": CODE }`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use campus_core::content_tree::{Lesson, Module, NewLesson, NewModule};
use campus_core::entities::Statistics;
use campus_core::list_query::{ListQuery, Paginated, Resource};
use campus_core::session::SessionProfile;
use campus_core::types::DbId;
use campus_core::upload::{CompleteUpload, InitiatedUpload};
use campus_core::wizard::WizardKind;

use crate::api::{ContentApi, EntityApi, ListApi, RecordApi, StorageApi};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Standard `{ "data": T }` envelope.
#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

/// Standard `{ "error", "code" }` failure body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: DbId,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: String,
}

/// HTTP client for one backend.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    api_url: String,
    access_token: Option<String>,
}

impl HttpApi {
    /// Build a client with the configured base URL and request timeout.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    /// Attach the session's bearer token to every backend request.
    pub fn with_session(mut self, session: Option<&SessionProfile>) -> Self {
        self.access_token = session.map(|s| s.access_token.clone());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, or an [`ClientError::Api`]
    /// carrying the backend's error message.
    async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let raw = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let (message, code) = match serde_json::from_str::<ErrorBody>(&raw) {
            Ok(body) => (body.error, body.code),
            Err(_) => (raw, None),
        };
        tracing::error!(status = status.as_u16(), %message, "Backend request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
            code,
        })
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        Self::parse_json::<DataResponse<T>>(response).await.map(|r| r.data)
    }

    async fn check_status(response: reqwest::Response) -> ClientResult<()> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn entity_path(kind: WizardKind) -> &'static str {
    kind.resource().path()
}

#[async_trait]
impl EntityApi for HttpApi {
    async fn create_entity(&self, kind: WizardKind, body: &Value) -> ClientResult<DbId> {
        let response = self
            .request(reqwest::Method::POST, entity_path(kind))
            .json(body)
            .send()
            .await?;
        let created: CreatedId = Self::parse_data(response).await?;
        Ok(created.id)
    }

    async fn update_entity(&self, kind: WizardKind, id: DbId, body: &Value) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::PUT, &format!("{}/{id}", entity_path(kind)))
            .json(body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn get_entity(&self, kind: WizardKind, id: DbId) -> ClientResult<Value> {
        let response = self
            .request(reqwest::Method::GET, &format!("{}/{id}", entity_path(kind)))
            .send()
            .await?;
        Self::parse_data(response).await
    }
}

#[async_trait]
impl ContentApi for HttpApi {
    async fn list_modules(&self, course_id: DbId) -> ClientResult<Vec<Module>> {
        let response = self
            .request(reqwest::Method::GET, &format!("courses/{course_id}/modules"))
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn create_module(&self, module: &NewModule) -> ClientResult<Module> {
        let response = self
            .request(reqwest::Method::POST, "modules")
            .json(module)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn delete_module(&self, id: DbId) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("modules/{id}"))
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn create_lesson(&self, lesson: &NewLesson) -> ClientResult<Lesson> {
        let response = self
            .request(reqwest::Method::POST, "lessons")
            .json(lesson)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn update_lesson(&self, lesson: &Lesson) -> ClientResult<Lesson> {
        let response = self
            .request(reqwest::Method::PUT, &format!("lessons/{}", lesson.id))
            .json(lesson)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn delete_lesson(&self, id: DbId) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("lessons/{id}"))
            .send()
            .await?;
        Self::check_status(response).await
    }
}

#[async_trait]
impl StorageApi for HttpApi {
    async fn initiate_upload(&self, file_name: &str, content_type: &str) -> ClientResult<InitiatedUpload> {
        let response = self
            .request(reqwest::Method::POST, "storage/multipart/initiate")
            .json(&json!({ "file_name": file_name, "content_type": content_type }))
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn presign_part(&self, file_name: &str, upload_id: &str, part_number: u32) -> ClientResult<String> {
        let response = self
            .request(reqwest::Method::POST, "storage/multipart/presign")
            .json(&json!({
                "file_name": file_name,
                "upload_id": upload_id,
                "part_number": part_number,
            }))
            .send()
            .await?;
        let presigned: UrlResponse = Self::parse_data(response).await?;
        Ok(presigned.url)
    }

    // Presigned URLs carry their own credentials; no bearer token.
    async fn put_part(&self, url: &str, bytes: Vec<u8>) -> ClientResult<String> {
        let response = self.client.put(url).body(bytes).send().await?;
        let response = Self::ensure_success(response).await?;
        response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Decode("storage response has no ETag header".into()))
    }

    async fn complete_upload(&self, request: &CompleteUpload) -> ClientResult<String> {
        let response = self
            .request(reqwest::Method::POST, "storage/multipart/complete")
            .json(request)
            .send()
            .await?;
        let completed: UrlResponse = Self::parse_data(response).await?;
        Ok(completed.url)
    }
}

#[async_trait]
impl ListApi for HttpApi {
    async fn query_page(&self, resource: Resource, query: &ListQuery) -> ClientResult<Paginated<Value>> {
        let response = self
            .request(reqwest::Method::POST, &format!("{}/query", resource.path()))
            .json(query)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn delete_many(&self, resource: Resource, ids: &[DbId]) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, resource.path())
            .json(&json!({ "ids": ids }))
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn statistics(&self) -> ClientResult<Statistics> {
        let response = self
            .request(reqwest::Method::GET, "statistics")
            .send()
            .await?;
        Self::parse_data(response).await
    }
}

#[async_trait]
impl RecordApi for HttpApi {
    async fn create_record(&self, resource: Resource, body: &Value) -> ClientResult<Value> {
        let response = self
            .request(reqwest::Method::POST, resource.path())
            .json(body)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn update_record(&self, resource: Resource, id: DbId, body: &Value) -> ClientResult<Value> {
        let response = self
            .request(reqwest::Method::PUT, &format!("{}/{id}", resource.path()))
            .json(body)
            .send()
            .await?;
        Self::parse_data(response).await
    }
}
