//! Millisecond wall clock used for cache timestamps.

use std::sync::Arc;

/// Source of "now" in milliseconds. Injected into [`crate::QueryCache`] so
/// tests can move time forward without sleeping.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// The platform clock: `Date.now()` on WASM, `SystemTime` on native.
pub fn system_clock() -> Clock {
    Arc::new(current_millis)
}

pub fn current_millis() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
