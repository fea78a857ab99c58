use serde::{Deserialize, Deserializer, Serialize};

// Record fields default when absent: the backend is trusted to send complete
// records, and a partial one still renders. Keyed events (`SpeedUpdate`,
// `RecordRef`) require their `id`.

/// Generic violation record (red-light, no-helmet, wrong-way).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Violation {
    pub id: String,
    /// Base64 still image of the offending frame.
    pub img_src: String,
    pub class_name: String,
    /// Epoch milliseconds when the backend observed the event.
    pub detected_at: f64,
}

impl Violation {
    pub fn new(id: impl Into<String>, class_name: impl Into<String>, detected_at: f64) -> Self {
        Self {
            id: id.into(),
            img_src: String::new(),
            class_name: class_name.into(),
            detected_at,
        }
    }
}

/// Overspeeding record; `highest_speed` keeps rising while the vehicle is tracked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverspeedingViolation {
    pub id: String,
    pub img_src: String,
    pub class_name: String,
    pub detected_at: f64,
    /// Km/h.
    #[serde(deserialize_with = "lenient_f64")]
    pub highest_speed: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinate {
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PotholeReport {
    pub id: String,
    pub img_src: String,
    pub class_name: String,
    pub detected_at: f64,
    pub coordinate: Coordinate,
}

/// A lookout vehicle recognised by its plate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleSighting {
    pub id: String,
    pub img_src: String,
    pub class_name: String,
    pub detected_at: f64,
    pub plate_number: String,
}

/// A lookout person matched by face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonSighting {
    pub id: String,
    pub img_src: String,
    pub class_name: String,
    pub detected_at: f64,
    /// Reference image name the face matched against.
    pub person_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
}

/// Payload of `server:update-overspeeding`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedUpdate {
    pub id: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub highest_speed: f64,
}

/// Payload of removal events: only the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: String,
}

/// Accepts `72`, `72.5` or `"72"`; older backends sent speeds as strings.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
