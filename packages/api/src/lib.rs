//! # API crate: HTTP client for the JobDesk admin panel
//!
//! Every screen of the admin panel talks to the REST backend through an
//! [`ApiClient`]. The client owns the shared [`QueryCache`](store::QueryCache),
//! so reads are deduplicated across views and writes invalidate exactly the
//! views they affect.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | `ApiClient`: transport, base URL, auth scheme, cache, invalidation map |
//! | [`query`] | Cached reads with freshness, retention, retry and cancellation |
//! | [`mutation`] | Create / update / delete / actions with invalidation and toasts |
//! | [`upload`] | Chunked multipart uploads with progress |
//! | [`admin`] | Typed reads and actions (jobs, contacts, view counters) |
//! | [`resources`] | The REST collections the panel consumes |
//! | [`endpoint`] | Base URL normalization and query strings |
//! | [`auth`] | `Authorization` header scheme |
//! | [`transport`] | HTTP seam; `reqwest` in production |
//! | [`settings`] | Layered configuration (`config` + `dotenvy`) |
//! | [`notify`] | Toast notifications |
//! | [`error`] | `ApiError` |

pub mod admin;
pub mod auth;
pub mod client;
mod coalesce;
pub mod endpoint;
pub mod error;
pub mod mutation;
pub mod notify;
pub mod query;
pub mod resources;
pub mod settings;
pub mod transport;
pub mod upload;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use admin::{company_jobs_spec, jobs_spec};
pub use auth::AuthScheme;
pub use client::ApiClient;
pub use endpoint::{ApiBase, Endpoint};
pub use error::{ApiError, Result};
pub use mutation::{Mutation, MutationKind, MutationOptions, MutationOutcome};
pub use notify::{Notifier, Toast, ToastLevel, TracingNotifier};
pub use query::{QuerySpec, QueryState, QueryStatus};
pub use resources::Resource;
pub use settings::Settings;
pub use transport::{DynTransport, Method, ReqwestTransport, Transport};
pub use upload::{ChunkPlan, ChunkedUpload, FileBlob, UploadOptions, UploadedFile};

pub use store::models;
pub use store::{CacheEvent, CachePolicy, FieldError, InvalidationMap, QueryCache, QueryKey, Validate};
