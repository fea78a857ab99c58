use crate::feed::app_data::AppMetadata;
use crate::feed::detection::{
    OverspeedingViolation, PersonSighting, PotholeReport, RecordRef, SpeedUpdate,
    VehicleSighting, Violation,
};
use crate::feed::traffic::TrafficTick;
use crate::prelude::{Category, SyncError, SyncResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const APP_DATA: &str = "server:app-data";
pub const RED_LIGHT_VIOLATION: &str = "server:red-light-violation";
pub const NO_HELMET_VIOLATION: &str = "server:no-helmet-violation";
pub const REMOVE_NO_HELMET_VIOLATION: &str = "server:remove-no-helmet-violation";
pub const OVERSPEEDING: &str = "server:overspeeding";
pub const UPDATE_OVERSPEEDING: &str = "server:update-overspeeding";
pub const POTHOLE: &str = "server:pothole";
pub const WRONG_WAY: &str = "server:wrong-way";
pub const VEHICLE_FOUND: &str = "server:vehicle-found";
pub const TRAFFIC_CONTROL: &str = "server:traffic-control";
pub const PERSON_DETECTED: &str = "server:person_detected";

/// Every event the backend pushes over the channel, one variant per tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    AppData(AppMetadata),
    RedLightViolation(Violation),
    NoHelmetViolation(Violation),
    NoHelmetCleared(RecordRef),
    Overspeeding(OverspeedingViolation),
    OverspeedingUpdated(SpeedUpdate),
    Pothole(PotholeReport),
    WrongWay(Violation),
    VehicleFound(VehicleSighting),
    TrafficControl(TrafficTick),
    PersonDetected(PersonSighting),
}

/// Wire shape before the payload is interpreted.
#[derive(Debug, Deserialize, Serialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl ServerEvent {
    /// Decodes one text frame.
    ///
    /// Returns `Ok(None)` for a well-formed envelope whose tag is not known,
    /// so newer backends can add events without breaking older clients.
    pub fn decode(text: &str) -> SyncResult<Option<ServerEvent>> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let data = envelope.data;
        let event = match envelope.event.as_str() {
            APP_DATA => ServerEvent::AppData(payload(APP_DATA, data)?),
            RED_LIGHT_VIOLATION => {
                ServerEvent::RedLightViolation(payload(RED_LIGHT_VIOLATION, data)?)
            }
            NO_HELMET_VIOLATION => {
                ServerEvent::NoHelmetViolation(payload(NO_HELMET_VIOLATION, data)?)
            }
            REMOVE_NO_HELMET_VIOLATION => {
                ServerEvent::NoHelmetCleared(payload(REMOVE_NO_HELMET_VIOLATION, data)?)
            }
            OVERSPEEDING => ServerEvent::Overspeeding(payload(OVERSPEEDING, data)?),
            UPDATE_OVERSPEEDING => {
                ServerEvent::OverspeedingUpdated(payload(UPDATE_OVERSPEEDING, data)?)
            }
            POTHOLE => ServerEvent::Pothole(payload(POTHOLE, data)?),
            WRONG_WAY => ServerEvent::WrongWay(payload(WRONG_WAY, data)?),
            VEHICLE_FOUND => ServerEvent::VehicleFound(payload(VEHICLE_FOUND, data)?),
            TRAFFIC_CONTROL => ServerEvent::TrafficControl(payload(TRAFFIC_CONTROL, data)?),
            PERSON_DETECTED => ServerEvent::PersonDetected(payload(PERSON_DETECTED, data)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Serializes the event into its `{event, data}` envelope.
    pub fn encode(&self) -> SyncResult<String> {
        let data = match self {
            ServerEvent::AppData(inner) => serde_json::to_value(inner)?,
            ServerEvent::RedLightViolation(inner)
            | ServerEvent::NoHelmetViolation(inner)
            | ServerEvent::WrongWay(inner) => serde_json::to_value(inner)?,
            ServerEvent::NoHelmetCleared(inner) => serde_json::to_value(inner)?,
            ServerEvent::Overspeeding(inner) => serde_json::to_value(inner)?,
            ServerEvent::OverspeedingUpdated(inner) => serde_json::to_value(inner)?,
            ServerEvent::Pothole(inner) => serde_json::to_value(inner)?,
            ServerEvent::VehicleFound(inner) => serde_json::to_value(inner)?,
            ServerEvent::TrafficControl(inner) => serde_json::to_value(inner)?,
            ServerEvent::PersonDetected(inner) => serde_json::to_value(inner)?,
        };
        let envelope = Envelope {
            event: self.tag().to_string(),
            data,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ServerEvent::AppData(_) => APP_DATA,
            ServerEvent::RedLightViolation(_) => RED_LIGHT_VIOLATION,
            ServerEvent::NoHelmetViolation(_) => NO_HELMET_VIOLATION,
            ServerEvent::NoHelmetCleared(_) => REMOVE_NO_HELMET_VIOLATION,
            ServerEvent::Overspeeding(_) => OVERSPEEDING,
            ServerEvent::OverspeedingUpdated(_) => UPDATE_OVERSPEEDING,
            ServerEvent::Pothole(_) => POTHOLE,
            ServerEvent::WrongWay(_) => WRONG_WAY,
            ServerEvent::VehicleFound(_) => VEHICLE_FOUND,
            ServerEvent::TrafficControl(_) => TRAFFIC_CONTROL,
            ServerEvent::PersonDetected(_) => PERSON_DETECTED,
        }
    }

    /// Store category the event mutates; `None` for app metadata.
    pub fn category(&self) -> Option<Category> {
        match self {
            ServerEvent::AppData(_) => None,
            ServerEvent::RedLightViolation(_) => Some(Category::RedLightPassing),
            ServerEvent::NoHelmetViolation(_) | ServerEvent::NoHelmetCleared(_) => {
                Some(Category::NoHelmet)
            }
            ServerEvent::Overspeeding(_) | ServerEvent::OverspeedingUpdated(_) => {
                Some(Category::Overspeeding)
            }
            ServerEvent::Pothole(_) => Some(Category::Pothole),
            ServerEvent::WrongWay(_) => Some(Category::WrongWay),
            ServerEvent::VehicleFound(_) => Some(Category::VehicleFinder),
            ServerEvent::TrafficControl(_) => Some(Category::TrafficControl),
            ServerEvent::PersonDetected(_) => Some(Category::PersonDetector),
        }
    }
}

fn payload<T: DeserializeOwned>(event: &'static str, data: Value) -> SyncResult<T> {
    serde_json::from_value(data).map_err(|source| SyncError::InvalidPayload { event, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_pothole_with_coordinate() {
        let text = json!({
            "event": "server:pothole",
            "data": {
                "id": "p1",
                "imgSrc": "aGk=",
                "className": "pothole",
                "detectedAt": 1717000000123.5,
                "coordinate": {"lat": 27.71, "long": 85.32}
            }
        })
        .to_string();

        match ServerEvent::decode(&text).unwrap() {
            Some(ServerEvent::Pothole(report)) => {
                assert_eq!(report.id, "p1");
                assert_eq!(report.coordinate.long, 85.32);
                assert_eq!(report.detected_at, 1717000000123.5);
            }
            other => panic!("unexpected decode result: {:?}", other),
        }
    }

    #[test]
    fn unknown_tag_is_not_an_error() {
        let text = r#"{"event":"server:speed-camera","data":{"id":"x"}}"#;
        assert!(ServerEvent::decode(text).unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = ServerEvent::decode("{event: pothole").unwrap_err();
        assert!(matches!(err, SyncError::MalformedEnvelope(_)));
    }

    #[test]
    fn keyed_event_without_id_is_invalid_payload() {
        let text = r#"{"event":"server:update-overspeeding","data":{"highestSpeed":91}}"#;
        let err = ServerEvent::decode(text).unwrap_err();
        assert!(matches!(
            err,
            SyncError::InvalidPayload {
                event: UPDATE_OVERSPEEDING,
                ..
            }
        ));
    }

    #[test]
    fn encode_produces_decodable_envelope() {
        let event = ServerEvent::OverspeedingUpdated(SpeedUpdate {
            id: "o7".into(),
            highest_speed: 104.0,
        });
        let text = event.encode().unwrap();
        assert!(text.contains("server:update-overspeeding"));
        assert_eq!(ServerEvent::decode(&text).unwrap(), Some(event));
    }

    #[test]
    fn person_detected_uses_underscore_tag() {
        let text = r#"{"event":"server:person_detected","data":{"id":"f1","personRef":"a.jpg"}}"#;
        let event = ServerEvent::decode(text).unwrap().unwrap();
        assert_eq!(event.category(), Some(Category::PersonDetector));
    }
}
