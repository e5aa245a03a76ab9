//! Toast notifications raised by mutations.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }
}

/// Receives the toasts a mutation raises. The UI crate renders them; headless
/// callers can use [`TracingNotifier`].
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Writes toasts to the `tracing` log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => tracing::error!("{}", toast.message),
            ToastLevel::Success | ToastLevel::Info => tracing::info!("{}", toast.message),
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, toast: Toast) {
        (**self).notify(toast)
    }
}
