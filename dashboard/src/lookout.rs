use log::debug;
use roadlenscore::{Endpoints, LookoutAction};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum LookoutError {
    #[error("lookout value is empty")]
    EmptyValue,
    #[error("lookout request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Deserialize)]
struct LookoutReply {
    message: String,
}

/// Edits the backend's lookout lists. The new lists arrive separately as the
/// next `server:app-data` envelope.
pub struct LookoutClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl LookoutClient {
    pub fn new(endpoints: Endpoints, timeout: Option<Duration>) -> Result<Self, LookoutError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoints,
        })
    }

    /// Sends one lookout request and returns the backend's message.
    pub async fn send(&self, action: LookoutAction, value: &str) -> Result<String, LookoutError> {
        if value.trim().is_empty() {
            return Err(LookoutError::EmptyValue);
        }
        let url = self.endpoints.lookout_url(action);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ action.field(): value }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookoutError::Rejected { status, body });
        }
        let reply: LookoutReply = response.json().await?;
        Ok(reply.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use warp::Filter;

    /// Echoes the posted value back so tests can check the body shape.
    async fn spawn_backend() -> SocketAddr {
        let echo = warp::post()
            .and(warp::path("add-lookout-vehicle"))
            .and(warp::path::end())
            .and(warp::body::json())
            .map(|body: serde_json::Value| {
                let plate = body["lookoutVehicle"].as_str().unwrap_or("?").to_string();
                warp::reply::json(&json!({ "message": format!("added {}", plate) }))
            });
        let missing = warp::post()
            .and(warp::path("remove-lookout-vehicle"))
            .map(|| {
                warp::reply::with_status("no such route here", warp::http::StatusCode::NOT_FOUND)
            });
        let (addr, server) = warp::serve(echo.or(missing)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    fn client_for(addr: SocketAddr) -> LookoutClient {
        let endpoints = Endpoints::new(&addr.to_string(), false).unwrap();
        LookoutClient::new(endpoints, Some(Duration::from_secs(5))).unwrap()
    }

    #[tokio::test]
    async fn posts_the_field_the_action_names() {
        let client = client_for(spawn_backend().await);
        let message = client
            .send(LookoutAction::AddVehicle, "BA 2 PA 4455")
            .await
            .unwrap();
        assert_eq!(message, "added BA 2 PA 4455");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let client = client_for(spawn_backend().await);
        let err = client
            .send(LookoutAction::RemoveVehicle, "BA 2 PA 4455")
            .await
            .unwrap_err();
        match err {
            LookoutError::Rejected { status, body } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(body, "no such route here");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn blank_value_is_refused_locally() {
        let endpoints = Endpoints::new("127.0.0.1:9", false).unwrap();
        let client = LookoutClient::new(endpoints, None).unwrap();
        let err = client.send(LookoutAction::AddPerson, "   ").await.unwrap_err();
        assert!(matches!(err, LookoutError::EmptyValue));
    }
}
