use crate::bridge::model::LookoutRegistry;
use anyhow::Context;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use roadlenscore::feed::ServerEvent;
use roadlenscore::LookoutAction;
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use warp::http::StatusCode;
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Reply};

/// Envelopes buffered per client before a slow one starts losing events.
const CLIENT_BACKLOG: usize = 256;

/// Fan-out point between the event generator and connected dashboards.
pub struct EventHub {
    registry: LookoutRegistry,
    events: broadcast::Sender<String>,
}

impl EventHub {
    pub fn new(registry: LookoutRegistry) -> Self {
        let (events, _) = broadcast::channel(CLIENT_BACKLOG);
        Self { registry, events }
    }

    pub fn registry(&self) -> &LookoutRegistry {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    /// Encodes and broadcasts an event. Returns how many clients received it.
    pub fn publish(&self, event: &ServerEvent) -> anyhow::Result<usize> {
        let envelope = event
            .encode()
            .with_context(|| format!("encoding {}", event.tag()))?;
        Ok(self.relay(envelope))
    }

    pub fn app_data_envelope(&self) -> anyhow::Result<String> {
        ServerEvent::AppData(self.registry.snapshot())
            .encode()
            .context("encoding app data")
    }

    /// Sends a pre-encoded envelope to every client.
    fn relay(&self, envelope: String) -> usize {
        // No receivers is not an error: nobody is watching yet.
        self.events.send(envelope).unwrap_or(0)
    }
}

/// `GET /`, `GET /ws` and the four lookout `POST`s.
pub fn routes(
    hub: Arc<EventHub>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let hub_filter = warp::any().map(move || hub.clone());

    let welcome = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"message": "Welcome to RoadLens!"})));

    let events = warp::path("ws")
        .and(warp::path::end())
        .and(warp::ws())
        .and(hub_filter.clone())
        .map(|ws: Ws, hub: Arc<EventHub>| {
            ws.on_upgrade(move |socket| client_session(socket, hub))
        });

    let lookout = warp::post()
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(hub_filter)
        .and_then(handle_lookout);

    welcome.or(events).or(lookout)
}

/// Binds the hub's routes and returns the bound address with the server
/// future. The server stops once `shutdown` resolves.
pub fn bind(
    hub: Arc<EventHub>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)> {
    warp::serve(routes(hub))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .with_context(|| format!("binding event hub on {}", addr))
}

async fn handle_lookout(
    path: String,
    body: Value,
    hub: Arc<EventHub>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let Some(action) = LookoutAction::from_path(&path) else {
        return Err(warp::reject::not_found());
    };
    let Some(value) = body.get(action.field()).and_then(Value::as_str) else {
        let reply = warp::reply::json(&json!({
            "message": format!("missing field {}", action.field())
        }));
        return Ok(warp::reply::with_status(reply, StatusCode::BAD_REQUEST).into_response());
    };

    let outcome = hub.registry().apply(action, value);
    info!("lookout {} {:?} -> {:?}", action.path(), value, outcome);
    if outcome.changed() {
        match hub.app_data_envelope() {
            Ok(envelope) => {
                hub.relay(envelope);
            }
            Err(err) => warn!("app data broadcast failed: {:#}", err),
        }
    }
    Ok(warp::reply::json(&json!({"message": outcome.message(action)})).into_response())
}

async fn client_session(socket: WebSocket, hub: Arc<EventHub>) {
    let (mut outbound, mut inbound) = socket.split();
    // Subscribe before the greeting so nothing published in between is lost.
    let mut events = hub.subscribe();

    match hub.app_data_envelope() {
        Ok(envelope) => {
            if outbound.send(Message::text(envelope)).await.is_err() {
                return;
            }
        }
        Err(err) => warn!("app data greeting failed: {:#}", err),
    }
    info!("dashboard client connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(envelope) => {
                    if outbound.send(Message::text(envelope)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("client lagging, skipped {} envelopes", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = inbound.next() => match incoming {
                Some(Ok(message)) if message.is_close() => break,
                Some(Ok(message)) => {
                    // Clients may push JSON; it is rebroadcast verbatim.
                    if let Ok(text) = message.to_str() {
                        if serde_json::from_str::<Value>(text).is_ok() {
                            hub.relay(text.to_string());
                        } else {
                            debug!("ignoring non-JSON client frame");
                        }
                    }
                }
                Some(Err(err)) => {
                    warn!("client socket error: {}", err);
                    break;
                }
                None => break,
            },
        }
    }
    info!("dashboard client disconnected");
}
