use serde::{Deserialize, Serialize};

/// Counts are capped here before classification.
const DENSITY_CAP: usize = 20;
const HEAVY_THRESHOLD: usize = 12;
const MODERATE_THRESHOLD: usize = 6;

/// A vehicle currently inside a lane's counting region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleReading {
    pub class_name: String,
    pub conf_score: f64,
    /// Seconds the vehicle has been waiting in the region.
    pub elapsed_time: f64,
}

/// Readings from one approach camera (`Left`, `Top`, `Right`, `Bottom`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneReading {
    pub video_id: String,
    pub detections: Vec<VehicleReading>,
}

/// One raw traffic-control snapshot, as pushed once per processed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrafficTick(pub Vec<LaneReading>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DensityLevel {
    Light,
    Moderate,
    Heavy,
}

impl DensityLevel {
    pub fn classify(vehicles: usize) -> Self {
        match vehicles.min(DENSITY_CAP) {
            n if n >= HEAVY_THRESHOLD => DensityLevel::Heavy,
            n if n >= MODERATE_THRESHOLD => DensityLevel::Moderate,
            _ => DensityLevel::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneSummary {
    pub video_id: String,
    pub total_vehicles: usize,
    /// `None` when the lane is empty.
    pub avg_elapsed_time: Option<f64>,
    /// Seconds of waiting summed over the lane: vehicles times average wait.
    pub cumulative_delay: f64,
    pub density: DensityLevel,
}

impl TrafficTick {
    pub fn lanes(&self) -> &[LaneReading] {
        &self.0
    }

    pub fn summarize(&self) -> Vec<LaneSummary> {
        self.0
            .iter()
            .map(|lane| {
                let total_vehicles = lane.detections.len();
                let elapsed: f64 = lane.detections.iter().map(|v| v.elapsed_time).sum();
                LaneSummary {
                    video_id: lane.video_id.clone(),
                    total_vehicles,
                    avg_elapsed_time: (total_vehicles > 0)
                        .then(|| elapsed / total_vehicles as f64),
                    cumulative_delay: elapsed,
                    density: DensityLevel::classify(total_vehicles),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane(video_id: &str, elapsed: &[f64]) -> LaneReading {
        LaneReading {
            video_id: video_id.into(),
            detections: elapsed
                .iter()
                .map(|&elapsed_time| VehicleReading {
                    class_name: "car".into(),
                    conf_score: 0.8,
                    elapsed_time,
                })
                .collect(),
        }
    }

    #[test]
    fn summary_averages_elapsed_time_per_lane() {
        let tick = TrafficTick(vec![lane("Left", &[2.0, 4.0]), lane("Top", &[])]);
        let summary = tick.summarize();
        assert_eq!(summary[0].total_vehicles, 2);
        assert_eq!(summary[0].avg_elapsed_time, Some(3.0));
        assert_eq!(summary[1].avg_elapsed_time, None);
        assert_eq!(summary[1].density, DensityLevel::Light);
    }

    #[test]
    fn cumulative_delay_is_count_times_average_wait() {
        let tick = TrafficTick(vec![lane("Right", &[1.5, 2.5, 5.0]), lane("Top", &[])]);
        let summary = tick.summarize();
        let right = &summary[0];
        assert_eq!(right.cumulative_delay, 9.0);
        assert_eq!(
            right.cumulative_delay,
            right.total_vehicles as f64 * right.avg_elapsed_time.unwrap()
        );
        assert_eq!(summary[1].cumulative_delay, 0.0);
    }

    #[test]
    fn density_thresholds_cap_at_twenty() {
        assert_eq!(DensityLevel::classify(5), DensityLevel::Light);
        assert_eq!(DensityLevel::classify(6), DensityLevel::Moderate);
        assert_eq!(DensityLevel::classify(12), DensityLevel::Heavy);
        assert_eq!(DensityLevel::classify(80), DensityLevel::Heavy);
    }

    #[test]
    fn tick_decodes_from_backend_shape() {
        let tick: TrafficTick = serde_json::from_str(
            r#"[{"video_id":"Left","detections":[{"className":"bus","confScore":0.9,"elapsedTime":1.5}]},
                {"video_id":"Bottom","detections":[]}]"#,
        )
        .unwrap();
        assert_eq!(tick.lanes().len(), 2);
        assert_eq!(tick.lanes()[0].detections[0].class_name, "bus");
    }
}
