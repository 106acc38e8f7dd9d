//! User-visible, non-blocking notifications emitted by the cart.
//!
//! Every mutating operation ends in exactly one [`Notice`] (or, for the silent
//! no-ops, none). A UI layer implements [`Notifier`] to turn these into
//! toasts; the default [`LogNotifier`] just logs them.

use std::fmt;
use std::sync::Mutex;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// What happened, so a UI can pick an icon or redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Added,
    QuantityUpdated,
    Removed,
    Cleared,
    CheckedOut,
    EmptyCart,
    SignInRequired,
    InvalidItem,
    PersistenceFailed,
}

/// A single user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(kind: NoticeKind, message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            kind,
            message: message.into(),
        }
    }

    pub fn info(kind: NoticeKind, message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            kind,
            message: message.into(),
        }
    }

    pub fn error(kind: NoticeKind, message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs notices through the `log` facade.
#[derive(Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => warn!("Cart notice: {}", notice),
            _ => info!("Cart notice: {}", notice),
        }
    }
}

/// Discards notices.
#[derive(Clone, Default)]
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _notice: Notice) {}
}

/// Keeps every notice in memory.
///
/// Handy for headless clients that poll for messages, and for tests.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn last(&self) -> Option<Notice> {
        match self.notices.lock() {
            Ok(guard) => guard.last().cloned(),
            Err(poisoned) => poisoned.into_inner().last().cloned(),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut guard) => guard.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}
