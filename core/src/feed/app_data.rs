use serde::{Deserialize, Serialize};

/// Entry of the backend's person registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonInfo {
    pub name: String,
    pub img_name: String,
}

/// Lookout lists pushed by the backend. Always replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppMetadata {
    /// Plate numbers, upper-cased by the backend.
    pub lookout_vehicles: Vec<String>,
    /// Reference image names of persons on lookout.
    pub lookout_persons: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub person_infos: Vec<PersonInfo>,
}

impl AppMetadata {
    pub fn person_name(&self, img_name: &str) -> Option<&str> {
        self.person_infos
            .iter()
            .find(|info| info.img_name == img_name)
            .map(|info| info.name.as_str())
    }
}

/// Canonical form of a lookout entry: trimmed and upper-cased.
pub fn normalize_lookout(value: &str) -> String {
    value.trim().to_uppercase()
}
