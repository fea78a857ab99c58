use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Delay between a lost connection and the next attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Shared configuration for the synchronizer and the endpoints it talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Host and port of the backend, without scheme (`10.0.0.5:8000`).
    pub server_domain: String,
    /// Use `wss`/`https` instead of `ws`/`http`.
    pub secure: bool,
    pub retry_delay_ms: u64,
}

impl SyncConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_domain: "127.0.0.1:8000".into(),
            secure: false,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
        }
    }
}

/// Lifecycle phase of the event channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionPhase {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionPhase::Connected)
    }
}

/// Fixed detection categories partitioning the store.
///
/// The serialized form is the camelCase key the backend uses for
/// `active_model` and for the store fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    RedLightPassing,
    NoHelmet,
    Overspeeding,
    WrongWay,
    Pothole,
    VehicleFinder,
    TrafficControl,
    PersonDetector,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::RedLightPassing,
        Category::NoHelmet,
        Category::Overspeeding,
        Category::WrongWay,
        Category::Pothole,
        Category::VehicleFinder,
        Category::TrafficControl,
        Category::PersonDetector,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::RedLightPassing => "redLightPassing",
            Category::NoHelmet => "noHelmet",
            Category::Overspeeding => "overspeeding",
            Category::WrongWay => "wrongWay",
            Category::Pothole => "pothole",
            Category::VehicleFinder => "vehicleFinder",
            Category::TrafficControl => "trafficControl",
            Category::PersonDetector => "personDetector",
        }
    }

    /// Traffic-control keeps chronological per-tick snapshots; every other
    /// category is newest-first.
    pub fn is_chronological(self) -> bool {
        matches!(self, Category::TrafficControl)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.key() == value)
            .ok_or_else(|| SyncError::UnknownCategory(value.to_string()))
    }
}

/// Common error type for the synchronizer and its codec.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("no tokio runtime available to drive the event channel")]
    NoRuntime,
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("unknown detection category: {0}")]
    UnknownCategory(String),
    #[error("websocket failure: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),
    #[error("invalid payload for {event}: {source}")]
    InvalidPayload {
        event: &'static str,
        source: serde_json::Error,
    },
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keys_parse_back() {
        for category in Category::ALL {
            assert_eq!(category.key().parse::<Category>().unwrap(), category);
        }
        assert!("speedCamera".parse::<Category>().is_err());
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: SyncConfig = serde_json::from_str(r#"{"server_domain":"cam.local"}"#).unwrap();
        assert_eq!(config.server_domain, "cam.local");
        assert_eq!(config.retry_delay(), DEFAULT_RETRY_DELAY);
        assert!(!config.secure);
    }
}
