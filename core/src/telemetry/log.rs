use log::{debug, info, warn};
use std::time::Duration;

/// Prefixes synchronizer log lines with the channel they belong to.
pub struct ChannelLog {
    channel: String,
}

impl ChannelLog {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    pub fn opened(&self, attempt: usize) {
        info!("[{}] event channel established (attempt {})", self.channel, attempt);
    }

    pub fn closed(&self, reason: &str) {
        info!("[{}] event channel closed: {}", self.channel, reason);
    }

    pub fn open_failed(&self, error: &dyn std::fmt::Display) {
        warn!("[{}] failed to open event channel: {}", self.channel, error);
    }

    pub fn retry_scheduled(&self, delay: Duration) {
        info!("[{}] reconnecting in {:?}", self.channel, delay);
    }

    pub fn dropped(&self, error: &dyn std::fmt::Display) {
        warn!("[{}] dropping envelope: {}", self.channel, error);
    }

    pub fn ignored(&self, text: &str) {
        debug!("[{}] ignoring envelope with unknown tag: {:.80}", self.channel, text);
    }

    pub fn record(&self, message: &str) {
        debug!("[{}] {}", self.channel, message);
    }
}
