//! In-memory [`Transport`] for tests: records every request and answers from a
//! script, falling back to `200 {}` when the script runs dry. Also a
//! [`Notifier`] that keeps every toast.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::task::Poll;

use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::notify::{Notifier, Toast};
use crate::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Result<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    yielding: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend once inside every request so concurrent callers interleave.
    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    pub fn respond_json(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(HttpResponse {
            status,
            body: body.to_string().into_bytes(),
        }))
    }

    pub fn respond_empty(&self, status: u16) -> &Self {
        self.push(Ok(HttpResponse {
            status,
            body: Vec::new(),
        }))
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.push(Err(ApiError::Transport(message.to_string())))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn push(&self, response: Result<HttpResponse>) -> &Self {
        self.script.lock().unwrap().push_back(response);
        self
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        if self.yielding {
            let mut yielded = false;
            futures::future::poll_fn(|cx| {
                if yielded {
                    Poll::Ready(())
                } else {
                    yielded = true;
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            })
            .await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 200,
                body: b"{}".to_vec(),
            })
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}
