//! Chunked multipart upload of lesson media.
//!
//! Pre-flight gates (type, size, video duration) run before any network
//! call. The transfer is initiate, then one presign + PUT per chunk in
//! order, then complete. Any failure aborts the whole upload; there is no
//! resume, the user starts again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use campus_core::upload::{
    check_video_duration, parse_probe_duration, plan_chunks, validate_image_attachment, validate_video_mime,
    CompleteUpload, CompletedPart, FfprobeOutput, UploadError,
};

use crate::api::StorageApi;
use crate::error::{ClientError, ClientResult};

/// A local file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    /// Object name requested from storage.
    pub file_name: String,
    pub content_type: String,
}

impl UploadFile {
    /// Use the path's final component as the object name.
    pub fn new(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self {
            path,
            file_name,
            content_type: content_type.into(),
        }
    }
}

/// Reads a media file's duration.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn duration_secs(&self, path: &Path) -> Result<f64, UploadError>;
}

/// [`MediaProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration_secs(&self, path: &Path) -> Result<f64, UploadError> {
        let output = tokio::process::Command::new("ffprobe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(|e| UploadError::Probe(format!("ffprobe not available: {e}")))?;

        if !output.status.success() {
            return Err(UploadError::Probe(format!(
                "ffprobe exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| UploadError::Probe(format!("unreadable ffprobe output: {e}")))?;
        parse_probe_duration(&probe).ok_or_else(|| UploadError::Probe("no duration in ffprobe output".into()))
    }
}

pub struct ChunkedUploader<A, P> {
    api: Arc<A>,
    probe: P,
    chunk_size: u64,
}

impl<A: StorageApi, P: MediaProbe> ChunkedUploader<A, P> {
    pub fn new(api: Arc<A>, probe: P, chunk_size: u64) -> Self {
        Self {
            api,
            probe,
            chunk_size,
        }
    }

    /// Upload a lesson video. Returns the final object URL.
    pub async fn upload_video(&self, file: &UploadFile) -> ClientResult<String> {
        validate_video_mime(&file.content_type).map_err(|e| preflight(file, e))?;
        let seconds = self
            .probe
            .duration_secs(&file.path)
            .await
            .map_err(|e| preflight(file, e))?;
        check_video_duration(seconds).map_err(|e| preflight(file, e))?;

        self.transfer(file).await
    }

    /// Upload an article image. Returns the final object URL.
    pub async fn upload_image(&self, file: &UploadFile) -> ClientResult<String> {
        let size = file_size(&file.path).await.map_err(|e| aborted(file, "stat", e))?;
        validate_image_attachment(&file.content_type, size).map_err(|e| preflight(file, e))?;

        self.transfer(file).await
    }

    async fn transfer(&self, file: &UploadFile) -> ClientResult<String> {
        let total = file_size(&file.path).await.map_err(|e| aborted(file, "stat", e))?;
        if total == 0 {
            return Err(preflight(file, UploadError::Empty));
        }
        let spans = plan_chunks(total, self.chunk_size);

        let session = self
            .api
            .initiate_upload(&file.file_name, &file.content_type)
            .await
            .map_err(|e| aborted(file, "initiate", e))?;

        let mut reader = tokio::fs::File::open(&file.path)
            .await
            .map_err(|e| aborted(file, "open", e))?;
        let mut parts = Vec::with_capacity(spans.len());

        for span in &spans {
            let mut chunk = vec![0u8; span.len as usize];
            reader
                .read_exact(&mut chunk)
                .await
                .map_err(|e| aborted(file, "read", e))?;

            let url = self
                .api
                .presign_part(&session.file_name, &session.upload_id, span.part_number)
                .await
                .map_err(|e| aborted(file, "presign", e))?;
            let e_tag = self
                .api
                .put_part(&url, chunk)
                .await
                .map_err(|e| aborted(file, "put part", e))?;

            tracing::debug!(
                file = %file.file_name,
                part = span.part_number,
                of = spans.len(),
                "Uploaded part"
            );
            parts.push(CompletedPart {
                part_number: span.part_number,
                e_tag,
            });
        }

        let request = CompleteUpload {
            file_name: session.file_name,
            upload_id: session.upload_id,
            parts,
        };
        let url = self
            .api
            .complete_upload(&request)
            .await
            .map_err(|e| aborted(file, "complete", e))?;

        tracing::info!(file = %file.file_name, parts = request.parts.len(), bytes = total, "Upload complete");
        Ok(url)
    }
}

async fn file_size(path: &Path) -> std::io::Result<u64> {
    tokio::fs::metadata(path).await.map(|m| m.len())
}

fn preflight(file: &UploadFile, error: UploadError) -> ClientError {
    tracing::warn!(file = %file.file_name, error = %error, "Upload rejected");
    ClientError::Upload(error)
}

fn aborted(file: &UploadFile, phase: &str, error: impl std::fmt::Display) -> ClientError {
    tracing::error!(file = %file.file_name, phase, error = %error, "Upload aborted");
    ClientError::Upload(UploadError::Transfer(format!("{phase}: {error}")))
}
