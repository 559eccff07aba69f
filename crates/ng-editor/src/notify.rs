//! Transient user-facing messages.

use serde::Serialize;
use std::fmt;

pub const IMPORT_STARTED: &str = "Importing workspace...";
pub const IMPORT_SUCCEEDED: &str = "Workspace imported successfully";
pub const EXPORT_SUCCEEDED: &str = "Workspace exported successfully";
pub const EXPORT_FAILED: &str = "Failed to export workspace";
pub const NO_ACTIVE_WORKSPACE: &str = "No active workspace to import into";
pub const READ_FAILED: &str = "Failed to read file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Error,
}

impl Severity {
    /// How long a message of this severity stays on screen.
    pub const fn default_duration_ms(self) -> u32 {
        match self {
            Severity::Success => 3000,
            Severity::Info => 2000,
            Severity::Error => 5000,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration_ms: u32,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            duration_ms: severity.default_duration_ms(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Shows notifications to the user.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Notifier that keeps every message, newest last.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Notification> {
        self.entries.last()
    }

    /// Take all queued messages, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.entries)
    }
}

impl Notifier for NotificationLog {
    fn notify(&mut self, notification: Notification) {
        log::debug!(
            "notify [{}] {} ({} ms)",
            notification.severity,
            notification.message,
            notification.duration_ms
        );
        self.entries.push(notification);
    }
}
