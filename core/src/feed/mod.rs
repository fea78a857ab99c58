pub mod app_data;
pub mod detection;
pub mod envelope;
pub mod traffic;

pub use app_data::{normalize_lookout, AppMetadata, PersonInfo};
pub use detection::{
    Coordinate, OverspeedingViolation, PersonSighting, PotholeReport, RecordRef, SpeedUpdate,
    VehicleSighting, Violation,
};
pub use envelope::ServerEvent;
pub use traffic::{DensityLevel, LaneReading, LaneSummary, TrafficTick, VehicleReading};
