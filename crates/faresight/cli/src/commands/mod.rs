//! CLI command implementations

pub mod analytics;
pub mod anomalies;
pub mod forecast;
pub mod health;
pub mod notifications;
pub mod sources;

use std::sync::Arc;

use faresight_engine::{FareSightConfig, StatusChannel, ViewContext};
use faresight_types::StatusMessage;
use tokio::sync::broadcast;

use crate::output::{drain_status, OutputFormat};

/// Engine context shared by every command of one invocation.
pub struct Session {
    pub ctx: ViewContext,
    pub format: OutputFormat,
    status_rx: broadcast::Receiver<StatusMessage>,
}

impl Session {
    pub fn new(config: FareSightConfig, format: OutputFormat) -> Self {
        let status = StatusChannel::new(config.stores.status_capacity);
        let status_rx = status.subscribe();
        Self {
            ctx: ViewContext::new(config, Arc::new(status)),
            format,
            status_rx,
        }
    }

    /// Print status messages emitted since the last call.
    pub fn flush_status(&mut self) {
        drain_status(&mut self.status_rx, self.format);
    }

    pub fn is_table(&self) -> bool {
        matches!(self.format, OutputFormat::Table)
    }
}
