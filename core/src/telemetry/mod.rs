pub mod log;
pub mod metrics;

pub use log::ChannelLog;
pub use metrics::{MetricsSnapshot, SyncMetrics};
