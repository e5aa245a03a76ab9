//! # Chunked uploads
//!
//! A file is cut into `ceil(len / chunk_size)` contiguous chunks. Each chunk is
//! a multipart POST with these fields:
//!
//! | Field | Value |
//! |-------|-------|
//! | `chunk` | the chunk bytes, sent under the original file name |
//! | `chunkIndex` | zero-based index |
//! | `totalChunks` | chunk count |
//! | `uploadId` | one UUID v4 shared by every chunk of the file |
//! | `fileName` | original file name |
//! | `mimeType` | MIME type, empty when unknown |
//!
//! All chunks but the last may be in flight together (bounded by
//! [`UploadOptions::concurrency`]). The last one goes out alone once the rest
//! succeeded; its response describes the reassembled file.

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;

use crate::client::{decode, ApiClient};
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::transport::{FormField, Method, RequestBody, Transport};

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct UploadOptions {
    pub chunk_size: usize,
    /// Extra attempts per chunk before the upload is abandoned.
    pub max_retries: u32,
    /// Chunks in flight at once.
    pub concurrency: usize,
    /// Progress reported once the last chunk is stored.
    pub progress_ceiling: f64,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: 0,
            concurrency: 1,
            progress_ceiling: 1.0,
        }
    }
}

impl UploadOptions {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_progress_ceiling(mut self, ceiling: f64) -> Self {
        self.progress_ceiling = ceiling;
        self
    }

    pub fn checked(self) -> Result<Self> {
        if self.chunk_size == 0 {
            return Err(ApiError::InvalidConfig("chunk size must be positive".into()));
        }
        if self.concurrency == 0 {
            return Err(ApiError::InvalidConfig("concurrency must be positive".into()));
        }
        if !(self.progress_ceiling > 0.0 && self.progress_ceiling <= 1.0) {
            return Err(ApiError::InvalidConfig(format!(
                "progress ceiling {} is outside (0, 1]",
                self.progress_ceiling
            )));
        }
        Ok(self)
    }
}

/// File contents picked by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// How a byte length splits into chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    len: usize,
    chunk_size: usize,
}

impl ChunkPlan {
    pub fn new(len: usize, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ApiError::InvalidConfig("chunk size must be positive".into()));
        }
        if len == 0 {
            return Err(ApiError::InvalidInput("file is empty".into()));
        }
        Ok(Self { len, chunk_size })
    }

    pub fn count(&self) -> usize {
        self.len.div_ceil(self.chunk_size)
    }

    pub fn range(&self, index: usize) -> std::ops::Range<usize> {
        let start = index * self.chunk_size;
        start..(start + self.chunk_size).min(self.len)
    }

    pub fn ranges(&self) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
        (0..self.count()).map(|i| self.range(i))
    }
}

/// What the server reports after the last chunk.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "filePath", alias = "file_path")]
    pub path: Option<String>,
    #[serde(default, alias = "fileUrl", alias = "file_url")]
    pub url: Option<String>,
    #[serde(default, alias = "fileName", alias = "filename")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl UploadedFile {
    /// Parse a final-chunk body, unwrapping a `data` or `file` envelope.
    pub fn from_response(body: Value) -> Result<Self> {
        let inner = match body {
            Value::Object(map) => ["data", "file"]
                .iter()
                .find_map(|key| map.get(*key).filter(|v| v.is_object()).cloned())
                .unwrap_or(Value::Object(map)),
            _ => return Err(ApiError::IncompleteUpload),
        };
        let file: UploadedFile = serde_json::from_value(inner)?;
        if file.id.is_some() || file.path.is_some() || file.url.is_some() {
            Ok(file)
        } else {
            Err(ApiError::IncompleteUpload)
        }
    }

    /// The best reference to store on a record: url, then path, then id.
    pub fn reference(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| self.path.clone())
            .or_else(|| self.id.as_ref().map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }))
    }
}

/// One upload job. Options default to the client's.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkedUpload {
    file: FileBlob,
    endpoint: Endpoint,
    token: Option<String>,
    headers: Vec<(String, String)>,
    options: Option<UploadOptions>,
}

impl ChunkedUpload {
    pub fn new(file: FileBlob) -> Self {
        Self {
            file,
            endpoint: Endpoint::new("upload"),
            token: None,
            headers: Vec::new(),
            options: None,
        }
    }

    pub fn to(mut self, endpoint: impl Into<Endpoint>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn file(&self) -> &FileBlob {
        &self.file
    }
}

impl<T: Transport> ApiClient<T> {
    /// Send `upload` chunk by chunk, calling `on_progress` after each stored chunk.
    pub async fn upload(
        &self,
        upload: &ChunkedUpload,
        mut on_progress: impl FnMut(f64),
    ) -> Result<UploadedFile> {
        let options = upload
            .options
            .clone()
            .unwrap_or_else(|| self.upload_options().clone())
            .checked()?;
        let plan = ChunkPlan::new(upload.file.len(), options.chunk_size)?;
        let total = plan.count();
        let upload_id = uuid::Uuid::new_v4().to_string();
        let progress = |done: usize| options.progress_ceiling * done as f64 / total as f64;

        let mut leading = stream::iter(0..total - 1)
            .map(|index| self.send_chunk(upload, &options, &plan, &upload_id, index))
            .buffer_unordered(options.concurrency);
        let mut done = 0;
        while let Some(result) = leading.next().await {
            result?;
            done += 1;
            on_progress(progress(done));
        }
        drop(leading);

        let body = self
            .send_chunk(upload, &options, &plan, &upload_id, total - 1)
            .await?;
        let file = UploadedFile::from_response(decode(&body)?)?;
        on_progress(options.progress_ceiling);
        tracing::info!(
            file = %upload.file.name,
            bytes = upload.file.len(),
            chunks = total,
            upload_id = %upload_id,
            "upload complete"
        );
        Ok(file)
    }

    async fn send_chunk(
        &self,
        upload: &ChunkedUpload,
        options: &UploadOptions,
        plan: &ChunkPlan,
        upload_id: &str,
        index: usize,
    ) -> Result<Vec<u8>> {
        let total = plan.count();
        let mut attempt = 0;
        loop {
            let result = async {
                let mut request = self.build_request(
                    Method::Post,
                    &upload.endpoint,
                    upload.token.as_deref(),
                    chunk_form(upload, plan, upload_id, index),
                )?;
                request.headers.extend(upload.headers.iter().cloned());
                Ok::<_, ApiError>(self.send(request).await?.body)
            }
            .await;
            match result {
                Ok(body) => return Ok(body),
                Err(e) if attempt < options.max_retries => {
                    attempt += 1;
                    tracing::warn!(index, total, attempt, error = %e, "chunk failed, retrying");
                }
                Err(e) => {
                    return Err(ApiError::Upload {
                        index,
                        total,
                        source: Box::new(e),
                    })
                }
            }
        }
    }
}

fn chunk_form(upload: &ChunkedUpload, plan: &ChunkPlan, upload_id: &str, index: usize) -> RequestBody {
    let file = &upload.file;
    RequestBody::Multipart(vec![
        FormField::Bytes {
            name: "chunk".into(),
            filename: file.name.clone(),
            mime: file.mime.clone(),
            data: file.bytes[plan.range(index)].to_vec(),
        },
        FormField::text("chunkIndex", index),
        FormField::text("totalChunks", plan.count()),
        FormField::text("uploadId", upload_id),
        FormField::text("fileName", &file.name),
        FormField::text("mimeType", file.mime.as_deref().unwrap_or_default()),
    ])
}
