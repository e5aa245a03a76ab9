//! Toast center: the queue of notifications raised by mutations and uploads.

use api::{Notifier, Toast, ToastLevel};
use dioxus::prelude::*;

/// Toasts kept on screen at once; older ones are dropped first.
pub const MAX_TOASTS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct ToastEntry {
    pub id: u64,
    pub timestamp: String,
    pub toast: Toast,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToastCenter {
    pub entries: Vec<ToastEntry>,
    next_id: u64,
}

impl ToastCenter {
    pub fn push(&mut self, toast: Toast, timestamp: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(ToastEntry { id, timestamp, toast });
        if self.entries.len() > MAX_TOASTS {
            let overflow = self.entries.len() - MAX_TOASTS;
            self.entries.drain(..overflow);
        }
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.entries.retain(|e| e.id != id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.toast.level == ToastLevel::Error)
    }
}

pub fn use_toasts() -> Signal<ToastCenter> {
    use_context::<Signal<ToastCenter>>()
}

pub fn push_toast(center: &mut Signal<ToastCenter>, toast: Toast) {
    match toast.level {
        ToastLevel::Error => tracing::warn!("{}", toast.message),
        ToastLevel::Success | ToastLevel::Info => tracing::info!("{}", toast.message),
    }
    center.write().push(toast, current_time());
}

/// [`Notifier`] that feeds the toast center.
#[derive(Clone, Copy)]
pub struct ToastNotifier(pub Signal<ToastCenter>);

impl Notifier for ToastNotifier {
    fn notify(&self, toast: Toast) {
        let mut center = self.0;
        push_toast(&mut center, toast);
    }
}

#[cfg(target_arch = "wasm32")]
fn current_time() -> String {
    let date = js_sys::Date::new_0();
    let h = date.get_hours();
    let m = date.get_minutes();
    let s = date.get_seconds();
    format!("{h:02}:{m:02}:{s:02}")
}

#[cfg(not(target_arch = "wasm32"))]
fn current_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
