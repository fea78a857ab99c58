use crate::feed::{AppMetadata, ServerEvent};
use crate::store::detections::DetectionStore;
use serde::Serialize;

/// Everything a view needs: connectivity, detections and lookout metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub connected: bool,
    pub detections: DetectionStore,
    /// `None` until the backend sends its first `server:app-data`.
    pub app_data: Option<AppMetadata>,
}

impl Snapshot {
    /// Applies one decoded event. Returns `false` when nothing changed.
    pub fn apply(&mut self, event: ServerEvent) -> bool {
        match event {
            ServerEvent::AppData(data) => {
                self.app_data = Some(data);
                true
            }
            other => self.detections.apply(other),
        }
    }

    pub(crate) fn set_connected(&mut self, connected: bool) -> bool {
        let changed = self.connected != connected;
        self.connected = connected;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Violation;

    #[test]
    fn app_data_is_replaced_wholesale() {
        let mut snapshot = Snapshot::default();
        snapshot.apply(ServerEvent::AppData(AppMetadata {
            lookout_vehicles: vec!["BA 1 PA 1".into(), "BA 2 PA 2".into()],
            lookout_persons: vec!["A.JPG".into()],
            ..Default::default()
        }));
        snapshot.apply(ServerEvent::AppData(AppMetadata {
            lookout_vehicles: vec!["BA 3 PA 3".into()],
            ..Default::default()
        }));

        let data = snapshot.app_data.unwrap();
        assert_eq!(data.lookout_vehicles, vec!["BA 3 PA 3".to_string()]);
        assert!(data.lookout_persons.is_empty());
    }

    #[test]
    fn detection_events_leave_app_data_alone() {
        let mut snapshot = Snapshot::default();
        assert!(snapshot.apply(ServerEvent::WrongWay(Violation::new("w1", "car", 3.0))));
        assert!(snapshot.app_data.is_none());
        assert_eq!(snapshot.detections.wrong_way.len(), 1);
    }

    #[test]
    fn connected_flag_reports_changes_only() {
        let mut snapshot = Snapshot::default();
        assert!(snapshot.set_connected(true));
        assert!(!snapshot.set_connected(true));
        assert!(snapshot.set_connected(false));
    }
}
