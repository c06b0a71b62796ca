//! Transient user-facing messages raised by pages.

use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Shared toast queue. Clones push to the same queue; the front end drains
/// it after each interaction.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    queue: Arc<Mutex<Vec<Toast>>>,
}

impl Toasts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Error => tracing::warn!(%message, "error toast"),
            ToastLevel::Success | ToastLevel::Info => tracing::debug!(%message, "toast"),
        }
        self.lock().push(Toast { level, message });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message);
    }

    /// Take every queued toast.
    #[must_use]
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.lock())
    }

    /// Most recent toast, left in the queue.
    #[must_use]
    pub fn last(&self) -> Option<Toast> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain() {
        let toasts = Toasts::new();
        let shared = toasts.clone();
        shared.success("Booking created");
        toasts.error("Network error");

        assert_eq!(toasts.last().map(|t| t.level), Some(ToastLevel::Error));
        let drained = toasts.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "Booking created");
        assert!(shared.drain().is_empty());
    }
}
