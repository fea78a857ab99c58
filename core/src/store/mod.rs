pub mod detections;
pub mod listeners;
pub mod snapshot;

pub use detections::DetectionStore;
pub use listeners::{Listeners, Subscription};
pub use snapshot::Snapshot;
