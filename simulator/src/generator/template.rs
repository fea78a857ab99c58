/// 1x1 grey PNG, base64 encoded, used for every synthetic snapshot.
pub const PLACEHOLDER_IMAGE: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAAAAAA6fptVAAAACklEQVR4nGNoAAAAggCBd81ytgAAAABJRU5ErkJggg==";

pub const VEHICLE_CLASSES: [&str; 5] = ["car", "motorcycle", "bus", "truck", "microbus"];

/// Approach cameras at a four-way junction.
pub const LANES: [&str; 4] = ["Left", "Top", "Right", "Bottom"];

/// Roughly central Kathmandu; pothole coordinates jitter around it.
pub const BASE_LATITUDE: f64 = 27.7172;
pub const BASE_LONGITUDE: f64 = 85.3240;

/// Posted limit the synthetic overspeeders exceed, km/h.
pub const SPEED_LIMIT: f64 = 50.0;
