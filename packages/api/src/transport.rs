//! # HTTP transport seam
//!
//! [`ApiClient`](crate::ApiClient) never talks to `reqwest` directly. It builds
//! an [`HttpRequest`] and hands it to a [`Transport`], which answers with an
//! [`HttpResponse`] whatever its status. Turning a non-2xx status into an error
//! is the client's job, so transports stay trivial.
//!
//! [`ReqwestTransport`] is the production implementation and works on native
//! and WASM targets. Tests provide their own in-memory implementation.
//! [`DynTransport`] erases the backend type so UI code can name one client
//! type whatever transport sits behind it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::LocalBoxFuture;

use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// One multipart form field.
#[derive(Clone, Debug, PartialEq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    Bytes {
        name: String,
        filename: String,
        mime: Option<String>,
        data: Vec<u8>,
    },
}

impl FormField {
    pub fn text(name: &str, value: impl ToString) -> Self {
        FormField::Text {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::Bytes { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Text value of a multipart field.
    pub fn form_text(&self, name: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Multipart(fields) => fields.iter().find_map(|f| match f {
                FormField::Text { name: n, value } if n == name => Some(value.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Byte payload of a multipart field.
    pub fn form_bytes(&self, name: &str) -> Option<&[u8]> {
        match &self.body {
            RequestBody::Multipart(fields) => fields.iter().find_map(|f| match f {
                FormField::Bytes { name: n, data, .. } if n == name => Some(data.as_slice()),
                _ => None,
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Errors mean the request never produced a response.
pub trait Transport {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(fields) => builder.multipart(multipart_form(fields)?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

trait ErasedTransport {
    fn send_boxed(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse>>;
}

impl<T: Transport> ErasedTransport for T {
    fn send_boxed(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse>> {
        Box::pin(self.send(request))
    }
}

/// Any [`Transport`] behind one concrete type.
#[derive(Clone)]
pub struct DynTransport(Arc<dyn ErasedTransport>);

impl DynTransport {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self(Arc::new(transport))
    }

    pub(crate) fn from_shared<T: Transport + 'static>(transport: Arc<T>) -> Self {
        Self(transport)
    }
}

impl fmt::Debug for DynTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DynTransport")
    }
}

impl Transport for DynTransport {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> {
        self.0.send_boxed(request)
    }
}

fn multipart_form(fields: Vec<FormField>) -> Result<reqwest::multipart::Form> {
    use reqwest::multipart::{Form, Part};

    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name, value),
            FormField::Bytes {
                name,
                filename,
                mime,
                data,
            } => {
                let mut part = Part::bytes(data).file_name(filename);
                if let Some(mime) = mime {
                    part = part.mime_str(&mime)?;
                }
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accessors() {
        let request = HttpRequest {
            method: Method::Post,
            url: "https://h.io/api/upload".into(),
            headers: vec![("Authorization".into(), "Bearer t".into())],
            body: RequestBody::Multipart(vec![
                FormField::text("chunkIndex", 0),
                FormField::Bytes {
                    name: "chunk".into(),
                    filename: "cv.pdf".into(),
                    mime: None,
                    data: vec![1, 2, 3],
                },
            ]),
        };
        assert_eq!(request.header("authorization"), Some("Bearer t"));
        assert_eq!(request.form_text("chunkIndex"), Some("0"));
        assert_eq!(request.form_bytes("chunk"), Some(&[1u8, 2, 3][..]));
        assert_eq!(request.form_text("chunk"), None);
        assert_eq!(Method::Patch.as_str(), "PATCH");
    }

    #[derive(Clone)]
    struct Teapot;

    impl Transport for Teapot {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
            Ok(HttpResponse { status: 418, body: vec![] })
        }
    }

    #[tokio::test]
    async fn test_dyn_transport_forwards() {
        let transport = DynTransport::new(Teapot);
        let request = HttpRequest {
            method: Method::Get,
            url: "https://h.io/api/jobs".into(),
            headers: vec![],
            body: RequestBody::Empty,
        };
        assert_eq!(transport.clone().send(request).await.unwrap().status, 418);
    }

    #[test]
    fn test_success_range() {
        assert!(HttpResponse { status: 204, body: vec![] }.is_success());
        assert!(!HttpResponse { status: 304, body: vec![] }.is_success());
        assert!(!HttpResponse { status: 500, body: vec![] }.is_success());
    }
}
