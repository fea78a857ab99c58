//! Client-side state synchronization for the RoadLens traffic dashboard.
//!
//! The backend pushes tagged `{event, data}` envelopes over a websocket. This
//! crate decodes them into a closed [`feed::ServerEvent`] type, folds each one
//! into an immutable [`store::Snapshot`], and keeps the channel alive with a
//! fixed-delay reconnect loop driven by [`sync::Synchronizer`].

pub mod endpoints;
pub mod feed;
pub mod prelude;
pub mod store;
pub mod sync;
pub mod telemetry;

pub use endpoints::{Endpoints, LookoutAction};
pub use prelude::{Category, ConnectionPhase, SyncConfig, SyncError, SyncResult};
pub use store::{DetectionStore, Snapshot};
pub use sync::Synchronizer;
