//! Operator notifications
//!
//! Every user-visible outcome (save confirmations, validation refusals,
//! transport failures, emergency alerts) flows through the [`Notify`] seam
//! as a single non-blocking notification. The console never blocks on a
//! notification being shown.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

/// Notification severity, mapped by front ends to toast styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// One operator-facing message
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// Sink for operator notifications
pub trait Notify: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Routes notifications to the tracing subscriber. The headless default.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notify for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info | Severity::Success => tracing::info!("{}", notification.message),
            Severity::Warning => tracing::warn!("{}", notification.message),
            Severity::Error => tracing::error!("{}", notification.message),
        }
    }
}

/// Accumulates notifications in memory. Used by tests to assert the
/// one-notification-per-failure rule.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything recorded so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut self.entries.lock().unwrap())
    }

    /// Messages recorded so far, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn count_of(&self, severity: Severity) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }
}

impl Notify for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.entries.lock().unwrap().push(notification);
    }
}
