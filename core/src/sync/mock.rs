use crate::prelude::{SyncError, SyncResult};
use crate::sync::transport::{Connector, InboundFrames};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type FrameSender = mpsc::UnboundedSender<SyncResult<String>>;
type FrameReceiver = mpsc::UnboundedReceiver<SyncResult<String>>;

enum Outcome {
    Refuse,
    Accept(FrameReceiver),
}

/// Connector whose attempts follow a script; once the script runs out,
/// `open` never completes.
pub(crate) struct ScriptedConnector {
    script: Mutex<VecDeque<Outcome>>,
    attempts: AtomicUsize,
}

/// Server side of one scripted connection.
pub(crate) struct FeedHandle {
    tx: FrameSender,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub(crate) fn accept(&self) -> FeedHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        self.script.lock().unwrap().push_back(Outcome::Accept(rx));
        FeedHandle { tx }
    }

    pub(crate) fn refuse(&self) {
        self.script.lock().unwrap().push_back(Outcome::Refuse);
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(&self) -> SyncResult<InboundFrames> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Outcome::Accept(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|frame| (frame, rx))
            })
            .boxed()),
            Some(Outcome::Refuse) => Err(SyncError::Transport("connection refused".into())),
            None => futures::future::pending::<SyncResult<InboundFrames>>().await,
        }
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

impl FeedHandle {
    pub(crate) fn send(&self, envelope: serde_json::Value) {
        self.send_raw(&envelope.to_string());
    }

    pub(crate) fn send_raw(&self, text: &str) {
        let _ = self.tx.send(Ok(text.to_string()));
    }

    /// Breaks the connection with a transport error.
    pub(crate) fn fail(self, reason: &str) {
        let _ = self.tx.send(Err(SyncError::Transport(reason.to_string())));
    }

    /// Clean close from the peer.
    pub(crate) fn close(self) {
        drop(self);
    }
}
