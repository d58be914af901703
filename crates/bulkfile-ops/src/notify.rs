//! Notification channels for surfacing operation errors.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bulkfile_core::BulkError;
use strum::Display;
use tracing::{debug, warn};

/// Sink for user-visible notifications, keyed by channel (e.g. `"files"`).
pub trait Notifier: Send + Sync {
    /// Remove every message on a channel.
    fn clear_channel(&self, channel: &str);

    /// Replace a channel's messages with an error.
    fn report_error(&self, channel: &str, error: &BulkError);
}

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Error,
}

/// A message shown on a channel until cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// In-memory notifier holding the current flashes per channel.
#[derive(Debug, Default)]
pub struct FlashBoard {
    channels: Mutex<HashMap<String, Vec<Flash>>>,
}

impl FlashBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a channel.
    pub fn add(&self, channel: &str, flash: Flash) {
        self.channels()
            .entry(channel.to_string())
            .or_default()
            .push(flash);
    }

    /// Messages currently on a channel.
    pub fn flashes(&self, channel: &str) -> Vec<Flash> {
        self.channels().get(channel).cloned().unwrap_or_default()
    }

    /// Whether any channel holds a message.
    pub fn is_empty(&self) -> bool {
        self.channels().values().all(Vec::is_empty)
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, Vec<Flash>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for FlashBoard {
    fn clear_channel(&self, channel: &str) {
        self.channels().remove(channel);
    }

    fn report_error(&self, channel: &str, error: &BulkError) {
        let mut channels = self.channels();
        let flashes = channels.entry(channel.to_string()).or_default();
        flashes.clear();
        flashes.push(Flash {
            level: FlashLevel::Error,
            message: error.to_string(),
        });
    }
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn clear_channel(&self, channel: &str) {
        debug!(target: "bulkfile::notify", channel, "cleared");
    }

    fn report_error(&self, channel: &str, error: &BulkError) {
        warn!(target: "bulkfile::notify", channel, %error, "operation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_error_replaces_channel() {
        let board = FlashBoard::new();
        board.add(
            "files",
            Flash {
                level: FlashLevel::Info,
                message: "stale".to_string(),
            },
        );
        board.report_error("files", &BulkError::RemoteRejection {
            message: "denied".to_string(),
        });

        let flashes = board.flashes("files");
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].level, FlashLevel::Error);
        assert_eq!(flashes[0].message, "denied");
    }

    #[test]
    fn test_clear_channel_leaves_others() {
        let board = FlashBoard::new();
        board.report_error("files", &BulkError::UserCancelled);
        board.report_error("server", &BulkError::Busy);

        board.clear_channel("files");
        assert!(board.flashes("files").is_empty());
        assert_eq!(board.flashes("server").len(), 1);
        assert!(!board.is_empty());
    }
}
