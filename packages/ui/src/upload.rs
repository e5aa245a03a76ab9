//! `use_chunked_upload`: progress and result of one file upload at a time.

use api::{ApiError, ChunkedUpload, FileBlob, Toast, UploadOptions, UploadedFile};
use dioxus::prelude::*;

use crate::provider::{use_api, use_session};
use crate::toast::{push_toast, use_toasts};

#[derive(Clone, Copy)]
pub struct UseChunkedUpload {
    options: CopyValue<Option<UploadOptions>>,
    endpoint: CopyValue<String>,
    progress: Signal<f64>,
    uploading: Signal<bool>,
    result: Signal<Option<UploadedFile>>,
    error: Signal<Option<ApiError>>,
    on_complete: Option<Callback<UploadedFile>>,
}

impl UseChunkedUpload {
    /// Fraction in `0.0..=ceiling` of the running or last upload.
    pub fn progress(&self) -> f64 {
        (self.progress)()
    }

    pub fn is_uploading(&self) -> bool {
        (self.uploading)()
    }

    pub fn uploaded(&self) -> Option<UploadedFile> {
        self.result.read().clone()
    }

    pub fn error(&self) -> Option<ApiError> {
        self.error.read().clone()
    }

    /// Upload `file`, replacing any previous result.
    pub fn start(&self, file: FileBlob) {
        let mut this = *self;
        let client = consume_context::<crate::AppClient>();
        let token = consume_context::<Signal<crate::provider::Session>>().peek().token.clone();
        let mut toasts = consume_context::<Signal<crate::ToastCenter>>();

        let mut upload = ChunkedUpload::new(file)
            .to(this.endpoint.peek().as_str())
            .with_optional_token(token);
        if let Some(options) = this.options.peek().clone() {
            upload = upload.with_options(options);
        }

        spawn(async move {
            this.uploading.set(true);
            this.progress.set(0.0);
            this.result.set(None);
            this.error.set(None);
            match client.upload(&upload, |p| this.progress.set(p)).await {
                Ok(file) => {
                    this.result.set(Some(file.clone()));
                    if let Some(on_complete) = this.on_complete {
                        on_complete.call(file);
                    }
                }
                Err(e) => {
                    push_toast(&mut toasts, Toast::error(e.user_message()));
                    this.error.set(Some(e));
                }
            }
            this.uploading.set(false);
        });
    }

    /// Forget the last result and progress.
    pub fn reset(&self) {
        let mut this = *self;
        this.progress.set(0.0);
        this.result.set(None);
        this.error.set(None);
    }
}

/// `options` of `None` uses the client's configured upload options.
pub fn use_chunked_upload(
    endpoint: &str,
    options: Option<UploadOptions>,
    on_complete: Option<Callback<UploadedFile>>,
) -> UseChunkedUpload {
    // Resolve the contexts here so a missing provider fails at render time.
    let _ = use_api();
    let _ = use_session();
    let _ = use_toasts();

    let mut stored_options = use_hook(|| CopyValue::new(options.clone()));
    if *stored_options.peek() != options {
        stored_options.set(options);
    }
    let mut stored_endpoint = use_hook(|| CopyValue::new(endpoint.to_string()));
    if stored_endpoint.peek().as_str() != endpoint {
        stored_endpoint.set(endpoint.to_string());
    }

    UseChunkedUpload {
        options: stored_options,
        endpoint: stored_endpoint,
        progress: use_signal(|| 0.0),
        uploading: use_signal(|| false),
        result: use_signal(|| None),
        error: use_signal(|| None),
        on_complete,
    }
}

/// MIME type for common upload extensions.
pub fn guess_mime(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(mime)
}

/// Read the first file of an `input[type=file]` change event.
pub async fn read_selected_file(event: &FormEvent) -> Option<FileBlob> {
    let engine = event.files()?;
    let name = engine.files().into_iter().next()?;
    let bytes = engine.read_file(&name).await?;
    let mut blob = FileBlob::new(name.clone(), bytes);
    if let Some(mime) = guess_mime(&name) {
        blob = blob.with_mime(mime);
    }
    Some(blob)
}
