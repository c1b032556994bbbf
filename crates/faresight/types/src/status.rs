//! Action lifecycle and transient user-facing messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a simulated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl ActionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Severity of a transient message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Work started; replaced by a later message with the same key.
    Loading,
    Success,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A transient message for a toast-style surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Messages sharing a key replace each other on the surface.
    pub key: String,
    pub level: StatusLevel,
    pub text: String,
    pub emitted_at: DateTime<Utc>,
}

impl StatusMessage {
    pub fn new(key: impl Into<String>, level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            level,
            text: text.into(),
            emitted_at: Utc::now(),
        }
    }

    pub fn loading(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(key, StatusLevel::Loading, text)
    }

    pub fn success(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(key, StatusLevel::Success, text)
    }

    pub fn error(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(key, StatusLevel::Error, text)
    }
}
