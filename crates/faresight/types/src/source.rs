//! Ingestion source cards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::DataSourceId;

/// What kind of system a source pulls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSourceKind {
    ApiIntegration,
    Database,
    WebScraper,
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiIntegration => write!(f, "API Integration"),
            Self::Database => write!(f, "Database"),
            Self::WebScraper => write!(f, "Web Scraper"),
        }
    }
}

/// Sync status of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceStatus {
    Active,
    Syncing,
    Warning,
    Error,
}

impl fmt::Display for DataSourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Syncing => write!(f, "syncing"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: DataSourceId,
    pub name: String,
    pub kind: DataSourceKind,
    pub status: DataSourceStatus,
    /// `None` while a sync is in flight or before the first sync.
    pub last_synced_at: Option<DateTime<Utc>>,
    pub records: u64,
    /// Health score, 0 to 100.
    pub health: u8,
}
