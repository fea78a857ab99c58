use crate::prelude::{SyncError, SyncResult};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use log::{debug, warn};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Inbound text frames of one open connection. The stream ends when the
/// peer closes; an `Err` item means the connection broke.
pub type InboundFrames = BoxStream<'static, SyncResult<String>>;

/// Opens connections to the backend's event channel.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self) -> SyncResult<InboundFrames>;

    /// Human-readable label used in logs.
    fn describe(&self) -> String;
}

/// Websocket connector for `ws://<domain>/ws`.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self) -> SyncResult<InboundFrames> {
        let (socket, response) = connect_async(self.url.as_str()).await?;
        debug!("websocket handshake with {} -> {}", self.url, response.status());

        // Pings are answered by tungstenite while the stream is polled.
        let frames = socket.filter_map(|message| async move { frame_text(message) });
        Ok(frames.boxed())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Maps one websocket frame to an inbound item. Control frames and binary
/// frames that are not UTF-8 yield nothing.
fn frame_text(
    message: Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<SyncResult<String>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(text)),
        Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
            Ok(text) => Some(Ok(text)),
            Err(err) => {
                warn!("dropping binary frame that is not UTF-8: {}", err);
                None
            }
        },
        Ok(Message::Close(frame)) => {
            debug!("peer closed websocket: {:?}", frame);
            None
        }
        Ok(_) => None,
        Err(err) => Some(Err(SyncError::WebSocket(err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::Error as WsError;

    #[test]
    fn utf8_binary_frames_are_read_as_text() {
        let frame = frame_text(Ok(Message::Binary(br#"{"event":"x"}"#.to_vec())));
        assert_eq!(frame.unwrap().unwrap(), r#"{"event":"x"}"#);
    }

    #[test]
    fn invalid_utf8_binary_frames_are_dropped() {
        assert!(frame_text(Ok(Message::Binary(vec![b'{', 0xff, 0xfe, b'}']))).is_none());
    }

    #[test]
    fn control_frames_yield_nothing_and_errors_pass_through() {
        assert!(frame_text(Ok(Message::Ping(Vec::new()))).is_none());
        assert!(frame_text(Ok(Message::Close(None))).is_none());
        let err = frame_text(Err(WsError::ConnectionClosed)).unwrap().unwrap_err();
        assert!(matches!(err, SyncError::WebSocket(_)));
    }
}
