//! Transient user-facing messages.
//!
//! Actions and views report progress through a [`StatusSink`]. The default
//! [`StatusChannel`] fans messages out over a broadcast channel; whatever
//! renders toasts subscribes to it.

use faresight_types::StatusMessage;
use tokio::sync::broadcast;
use tracing::debug;

/// Receiver of status messages.
pub trait StatusSink: Send + Sync {
    fn emit(&self, message: StatusMessage);
}

/// Broadcast-backed status sink.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    tx: broadcast::Sender<StatusMessage>,
}

impl StatusChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusMessage> {
        self.tx.subscribe()
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new(64)
    }
}

impl StatusSink for StatusChannel {
    fn emit(&self, message: StatusMessage) {
        debug!(key = %message.key, level = %message.level, text = %message.text, "Status message");
        // No receivers is fine: nobody is looking at the toasts.
        let _ = self.tx.send(message);
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentStatus;

impl StatusSink for SilentStatus {
    fn emit(&self, _message: StatusMessage) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use faresight_types::StatusLevel;

    #[test]
    fn test_channel_delivers_in_order() {
        let channel = StatusChannel::new(8);
        let mut rx = channel.subscribe();

        channel.emit(StatusMessage::loading("sync", "Syncing all data sources..."));
        channel.emit(StatusMessage::success("sync", "All sources synced successfully"));

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.level, StatusLevel::Loading);
        assert_eq!(second.level, StatusLevel::Success);
        assert_eq!(first.key, second.key);
    }

    #[test]
    fn test_emit_without_receivers() {
        let channel = StatusChannel::default();
        channel.emit(StatusMessage::error("export", "Failed to export log"));
        SilentStatus.emit(StatusMessage::error("export", "Failed to export log"));
    }
}
