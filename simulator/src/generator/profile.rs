use crate::generator::template::{
    BASE_LATITUDE, BASE_LONGITUDE, LANES, PLACEHOLDER_IMAGE, SPEED_LIMIT, VEHICLE_CLASSES,
};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use roadlenscore::feed::{
    AppMetadata, Coordinate, LaneReading, OverspeedingViolation, PersonSighting, PotholeReport,
    RecordRef, ServerEvent, SpeedUpdate, TrafficTick, VehicleReading, VehicleSighting, Violation,
};
use roadlenscore::Category;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Overspeeders and helmetless riders still "in frame" that may receive
/// follow-up events.
const MAX_OPEN_TRACKS: usize = 16;

/// Configuration for the synthetic detection feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Categories to emit; an empty list emits nothing.
    pub categories: Vec<Category>,
    /// Epoch milliseconds of the first event.
    pub start_ms: f64,
    /// Km/h.
    pub speed_limit: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            categories: Category::ALL.to_vec(),
            start_ms: 1_717_000_000_000.0,
            speed_limit: SPEED_LIMIT,
        }
    }
}

/// Seeded source of backend events. The same config and lookout lists
/// always produce the same sequence.
pub struct EventGenerator {
    rng: StdRng,
    categories: Vec<Category>,
    speed_limit: f64,
    clock_ms: f64,
    sequence: u64,
    speeders: VecDeque<(String, f64)>,
    helmetless: VecDeque<String>,
}

impl EventGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            categories: config.categories.clone(),
            speed_limit: config.speed_limit.max(1.0),
            clock_ms: config.start_ms,
            sequence: 0,
            speeders: VecDeque::new(),
            helmetless: VecDeque::new(),
        }
    }

    /// Draws the next event.
    ///
    /// Returns `None` when the drawn category has nothing to report, e.g.
    /// a vehicle finder tick while the lookout list is empty.
    pub fn next_event(&mut self, lookout: &AppMetadata) -> Option<ServerEvent> {
        let category = *self.categories.choose(&mut self.rng)?;
        self.clock_ms += self.rng.gen_range(200.0..1500.0);

        match category {
            Category::RedLightPassing => Some(ServerEvent::RedLightViolation(
                self.violation("rl", None),
            )),
            Category::NoHelmet => Some(self.no_helmet()),
            Category::Overspeeding => Some(self.overspeeding()),
            Category::WrongWay => Some(ServerEvent::WrongWay(self.violation("ww", None))),
            Category::Pothole => Some(self.pothole()),
            Category::VehicleFinder => self.vehicle_found(lookout),
            Category::TrafficControl => Some(ServerEvent::TrafficControl(self.traffic_tick())),
            Category::PersonDetector => self.person_detected(lookout),
        }
    }

    /// Collects up to `count` events, giving up after a bounded number of
    /// empty draws.
    pub fn batch(&mut self, count: usize, lookout: &AppMetadata) -> Vec<ServerEvent> {
        let mut events = Vec::with_capacity(count);
        let mut draws = 0;
        while events.len() < count && draws < count.saturating_mul(4) {
            draws += 1;
            if let Some(event) = self.next_event(lookout) {
                events.push(event);
            }
        }
        events
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{}-{:06}", prefix, self.sequence)
    }

    fn violation(&mut self, prefix: &str, class_name: Option<&str>) -> Violation {
        let class_name = match class_name {
            Some(name) => name,
            None => VEHICLE_CLASSES.choose(&mut self.rng).copied().unwrap_or("car"),
        };
        Violation {
            id: self.next_id(prefix),
            img_src: PLACEHOLDER_IMAGE.into(),
            class_name: class_name.into(),
            detected_at: self.clock_ms,
        }
    }

    fn no_helmet(&mut self) -> ServerEvent {
        if !self.helmetless.is_empty() && self.rng.gen_bool(0.3) {
            let index = self.rng.gen_range(0..self.helmetless.len());
            if let Some(id) = self.helmetless.remove(index) {
                return ServerEvent::NoHelmetCleared(RecordRef { id });
            }
        }
        let record = self.violation("nh", Some("motorcyclist"));
        track(&mut self.helmetless, record.id.clone());
        ServerEvent::NoHelmetViolation(record)
    }

    fn overspeeding(&mut self) -> ServerEvent {
        if !self.speeders.is_empty() && self.rng.gen_bool(0.5) {
            let index = self.rng.gen_range(0..self.speeders.len());
            let bump = self.rng.gen_range(1.0..8.0);
            if let Some((id, speed)) = self.speeders.get_mut(index) {
                *speed += bump;
                return ServerEvent::OverspeedingUpdated(SpeedUpdate {
                    id: id.clone(),
                    highest_speed: speed.round(),
                });
            }
        }
        let base = self.violation("os", None);
        let speed = (self.speed_limit + self.rng.gen_range(1.0..40.0)).round();
        track(&mut self.speeders, (base.id.clone(), speed));
        ServerEvent::Overspeeding(OverspeedingViolation {
            id: base.id,
            img_src: base.img_src,
            class_name: base.class_name,
            detected_at: base.detected_at,
            highest_speed: speed,
        })
    }

    fn pothole(&mut self) -> ServerEvent {
        let base = self.violation("ph", Some("pothole"));
        let coordinate = Coordinate {
            lat: BASE_LATITUDE + self.rng.gen_range(-0.02..0.02),
            long: BASE_LONGITUDE + self.rng.gen_range(-0.02..0.02),
        };
        ServerEvent::Pothole(PotholeReport {
            id: base.id,
            img_src: base.img_src,
            class_name: base.class_name,
            detected_at: base.detected_at,
            coordinate,
        })
    }

    fn vehicle_found(&mut self, lookout: &AppMetadata) -> Option<ServerEvent> {
        let plate = lookout.lookout_vehicles.choose(&mut self.rng)?.clone();
        let base = self.violation("vf", None);
        Some(ServerEvent::VehicleFound(VehicleSighting {
            id: base.id,
            img_src: base.img_src,
            class_name: base.class_name,
            detected_at: base.detected_at,
            plate_number: plate,
        }))
    }

    fn person_detected(&mut self, lookout: &AppMetadata) -> Option<ServerEvent> {
        let person_ref = lookout.lookout_persons.choose(&mut self.rng)?.clone();
        let base = self.violation("pd", Some("person"));
        let person_name = lookout.person_name(&person_ref).map(str::to_string);
        Some(ServerEvent::PersonDetected(PersonSighting {
            id: base.id,
            img_src: base.img_src,
            class_name: base.class_name,
            detected_at: base.detected_at,
            person_ref,
            person_name,
        }))
    }

    fn traffic_tick(&mut self) -> TrafficTick {
        let lanes = LANES
            .iter()
            .map(|lane| {
                let waiting = self.rng.gen_range(0..16);
                let detections = (0..waiting)
                    .map(|_| VehicleReading {
                        class_name: VEHICLE_CLASSES
                            .choose(&mut self.rng)
                            .copied()
                            .unwrap_or("car")
                            .into(),
                        conf_score: self.rng.gen_range(0.5..0.99),
                        elapsed_time: self.rng.gen_range(0.0..90.0),
                    })
                    .collect();
                LaneReading {
                    video_id: (*lane).into(),
                    detections,
                }
            })
            .collect();
        TrafficTick(lanes)
    }
}

fn track<T>(open: &mut VecDeque<T>, entry: T) {
    if open.len() == MAX_OPEN_TRACKS {
        open.pop_front();
    }
    open.push_back(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadlenscore::DetectionStore;

    fn lookout() -> AppMetadata {
        AppMetadata {
            lookout_vehicles: vec!["BA 2 PA 4455".into()],
            lookout_persons: vec!["sita.jpg".into()],
            person_infos: vec![roadlenscore::feed::PersonInfo {
                name: "Sita".into(),
                img_name: "sita.jpg".into(),
            }],
        }
    }

    #[test]
    fn same_seed_yields_same_sequence() {
        let config = GeneratorConfig {
            seed: 7,
            ..Default::default()
        };
        let first = EventGenerator::new(&config).batch(40, &lookout());
        let second = EventGenerator::new(&config).batch(40, &lookout());
        assert_eq!(first.len(), 40);
        assert_eq!(first, second);
    }

    #[test]
    fn only_configured_categories_are_emitted() {
        let config = GeneratorConfig {
            categories: vec![Category::Pothole, Category::TrafficControl],
            ..Default::default()
        };
        let events = EventGenerator::new(&config).batch(25, &AppMetadata::default());
        assert!(events.iter().all(|event| matches!(
            event.category(),
            Some(Category::Pothole) | Some(Category::TrafficControl)
        )));
    }

    #[test]
    fn lookout_categories_need_a_lookout_list() {
        let config = GeneratorConfig {
            categories: vec![Category::VehicleFinder, Category::PersonDetector],
            ..Default::default()
        };
        let mut generator = EventGenerator::new(&config);
        assert!(generator.batch(10, &AppMetadata::default()).is_empty());

        let events = generator.batch(10, &lookout());
        assert_eq!(events.len(), 10);
        for event in events {
            match event {
                ServerEvent::VehicleFound(record) => assert_eq!(record.plate_number, "BA 2 PA 4455"),
                ServerEvent::PersonDetected(record) => {
                    assert_eq!(record.person_name.as_deref(), Some("Sita"))
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn follow_up_events_reference_earlier_records() {
        let config = GeneratorConfig {
            seed: 11,
            categories: vec![Category::Overspeeding, Category::NoHelmet],
            ..Default::default()
        };
        let events = EventGenerator::new(&config).batch(200, &AppMetadata::default());

        let mut store = DetectionStore::default();
        for event in events {
            let follow_up = matches!(
                event,
                ServerEvent::OverspeedingUpdated(_) | ServerEvent::NoHelmetCleared(_)
            );
            // Every update or removal lands on a record the store already holds.
            assert!(store.apply(event) || !follow_up);
        }
    }

    #[test]
    fn traffic_ticks_cover_every_lane() {
        let config = GeneratorConfig {
            categories: vec![Category::TrafficControl],
            ..Default::default()
        };
        let event = EventGenerator::new(&config)
            .next_event(&AppMetadata::default())
            .unwrap();
        match event {
            ServerEvent::TrafficControl(tick) => {
                let lanes: Vec<&str> = tick.lanes().iter().map(|l| l.video_id.as_str()).collect();
                assert_eq!(lanes, LANES.to_vec());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
