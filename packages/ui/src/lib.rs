//! Dioxus hooks and components for the admin panel.
//!
//! Wrap the app in [`ApiProvider`] and render a [`Toaster`] once; pages then
//! read with [`use_query`], write with [`use_create`] / [`use_update`] /
//! [`use_delete`] and upload with [`use_chunked_upload`].

mod provider;
pub use provider::{use_api, use_session, ApiProvider, AppClient, Session};

pub mod toast;
pub use toast::{push_toast, use_toasts, ToastCenter, ToastEntry, ToastNotifier};

mod toaster;
pub use toaster::Toaster;

mod query;
pub use query::{use_query, UseQuery};

mod mutation;
pub use mutation::{use_create, use_delete, use_update, UseCreate, UseDelete, UseMutation, UseUpdate};

mod upload;
pub use upload::{guess_mime, read_selected_file, use_chunked_upload, UseChunkedUpload};
