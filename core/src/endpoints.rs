use crate::prelude::{Category, SyncConfig, SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Out-of-band lookout calls exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookoutAction {
    AddVehicle,
    RemoveVehicle,
    AddPerson,
    RemovePerson,
}

impl LookoutAction {
    pub const ALL: [LookoutAction; 4] = [
        LookoutAction::AddVehicle,
        LookoutAction::RemoveVehicle,
        LookoutAction::AddPerson,
        LookoutAction::RemovePerson,
    ];

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.path() == path)
    }

    pub fn is_vehicle(self) -> bool {
        matches!(self, LookoutAction::AddVehicle | LookoutAction::RemoveVehicle)
    }

    pub fn is_addition(self) -> bool {
        matches!(self, LookoutAction::AddVehicle | LookoutAction::AddPerson)
    }

    pub fn path(self) -> &'static str {
        match self {
            LookoutAction::AddVehicle => "add-lookout-vehicle",
            LookoutAction::RemoveVehicle => "remove-lookout-vehicle",
            LookoutAction::AddPerson => "add-lookout-person",
            LookoutAction::RemovePerson => "remove-lookout-person",
        }
    }

    /// JSON field carrying the value in the request body.
    pub fn field(self) -> &'static str {
        if self.is_vehicle() {
            "lookoutVehicle"
        } else {
            "lookoutPerson"
        }
    }
}

/// Addresses derived from the configured backend domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    domain: String,
    secure: bool,
}

impl Endpoints {
    pub fn new(domain: &str, secure: bool) -> SyncResult<Self> {
        let domain = domain.trim().trim_end_matches('/');
        if domain.is_empty() {
            return Err(SyncError::InvalidEndpoint("server domain is empty".into()));
        }
        if domain.contains("://") {
            return Err(SyncError::InvalidEndpoint(format!(
                "server domain must not carry a scheme: {}",
                domain
            )));
        }
        Ok(Self {
            domain: domain.to_string(),
            secure,
        })
    }

    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Self::new(&config.server_domain, config.secure)
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.domain)
    }

    /// Duplex event channel.
    pub fn events_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}/ws", scheme, self.domain)
    }

    /// Live video for one detector, consumed by a passive display surface.
    pub fn stream_video_url(&self, category: Category) -> String {
        format!(
            "{}/stream-video?active_model={}",
            self.base_url(),
            category.key()
        )
    }

    pub fn lookout_url(&self, action: LookoutAction) -> String {
        format!("{}/{}", self.base_url(), action.path())
    }
}
