use crate::feed::{
    OverspeedingViolation, PersonSighting, PotholeReport, ServerEvent, TrafficTick,
    VehicleSighting, Violation,
};
use crate::prelude::Category;
use serde::Serialize;
use std::collections::VecDeque;

/// Detections partitioned by category.
///
/// Event categories are newest-first; `traffic_control` is chronological.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionStore {
    pub red_light_passing: VecDeque<Violation>,
    pub no_helmet: VecDeque<Violation>,
    pub overspeeding: VecDeque<OverspeedingViolation>,
    pub wrong_way: VecDeque<Violation>,
    pub pothole: VecDeque<PotholeReport>,
    pub vehicle_finder: VecDeque<VehicleSighting>,
    pub traffic_control: Vec<TrafficTick>,
    pub person_detector: VecDeque<PersonSighting>,
}

impl DetectionStore {
    /// Folds one event into the store. Returns `false` when nothing changed.
    ///
    /// `AppData` is not a detection and leaves the store untouched.
    pub fn apply(&mut self, event: ServerEvent) -> bool {
        match event {
            ServerEvent::AppData(_) => false,
            ServerEvent::RedLightViolation(record) => {
                self.red_light_passing.push_front(record);
                true
            }
            ServerEvent::NoHelmetViolation(record) => {
                self.no_helmet.push_front(record);
                true
            }
            ServerEvent::NoHelmetCleared(key) => {
                remove_by_id(&mut self.no_helmet, &key.id, |record| &record.id)
            }
            ServerEvent::Overspeeding(record) => {
                self.overspeeding.push_front(record);
                true
            }
            ServerEvent::OverspeedingUpdated(update) => {
                let mut matched = false;
                for record in self.overspeeding.iter_mut().filter(|r| r.id == update.id) {
                    record.highest_speed = update.highest_speed;
                    matched = true;
                }
                matched
            }
            ServerEvent::Pothole(record) => {
                self.pothole.push_front(record);
                true
            }
            ServerEvent::WrongWay(record) => {
                self.wrong_way.push_front(record);
                true
            }
            ServerEvent::VehicleFound(record) => {
                self.vehicle_finder.push_front(record);
                true
            }
            ServerEvent::TrafficControl(tick) => {
                self.traffic_control.push(tick);
                true
            }
            ServerEvent::PersonDetected(record) => {
                self.person_detector.push_front(record);
                true
            }
        }
    }

    pub fn len(&self, category: Category) -> usize {
        match category {
            Category::RedLightPassing => self.red_light_passing.len(),
            Category::NoHelmet => self.no_helmet.len(),
            Category::Overspeeding => self.overspeeding.len(),
            Category::WrongWay => self.wrong_way.len(),
            Category::Pothole => self.pothole.len(),
            Category::VehicleFinder => self.vehicle_finder.len(),
            Category::TrafficControl => self.traffic_control.len(),
            Category::PersonDetector => self.person_detector.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.into_iter().all(|category| self.len(category) == 0)
    }

    pub fn latest_traffic(&self) -> Option<&TrafficTick> {
        self.traffic_control.last()
    }
}

/// Removes every record whose key matches, so a record the backend sent
/// twice does not linger.
fn remove_by_id<T>(records: &mut VecDeque<T>, id: &str, key: impl Fn(&T) -> &String) -> bool {
    let before = records.len();
    records.retain(|record| key(record) != id);
    records.len() != before
}
