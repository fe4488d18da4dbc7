//! Transient user-visible notifications

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

pub const AREA_MOVED: &str = "Cultivation area moved.";
pub const MOVE_FAILED: &str = "Error while moving area. Reloading data...";
pub const AREAS_LOAD_FAILED: &str = "Error loading cultivation areas.";
pub const STAGES_LOAD_FAILED: &str = "Error loading stages.";
pub const STAGE_CREATED: &str = "Stage created.";
pub const STAGE_UPDATED: &str = "Stage updated.";
pub const STAGE_DELETED: &str = "Stage deleted.";
pub const AREA_CREATED: &str = "Cultivation area created.";
pub const AREA_UPDATED: &str = "Cultivation area updated.";
pub const AREA_DELETED: &str = "Cultivation area deleted.";
pub const AREA_HAS_BATCHES: &str = "Cannot delete the cultivation area: it has associated batches.";
pub const STAGE_HAS_AREAS: &str = "Cannot delete the stage: it has associated cultivation areas.";
pub const FACILITY_CREATED: &str = "Facility created.";
pub const BATCH_CREATED: &str = "Batch created.";
pub const BUSY: &str = "Another change is still being saved.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// Where notifications go. Implemented by the host UI.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl NotificationSink for UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        if self.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}

/// Sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => tracing::error!("{}", notification.message),
            Severity::Warning => tracing::warn!("{}", notification.message),
            Severity::Success | Severity::Info => tracing::info!("{}", notification.message),
        }
    }
}
