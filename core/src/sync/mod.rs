#[cfg(test)]
pub(crate) mod mock;
pub mod synchronizer;
pub mod transport;

pub use synchronizer::Synchronizer;
pub use tokio_util::sync::CancellationToken;
pub use transport::{Connector, InboundFrames, WsConnector};
