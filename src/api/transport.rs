//! Wire-level transport seam.
//!
//! [`ApiClient`](crate::api::ApiClient) talks to the platform through the
//! [`Transport`] trait so tests can script responses without a network.
//! [`HttpTransport`] is the reqwest-backed implementation used in production.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ApiConfig;

/// HTTP method for a platform request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully built request, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    /// Query pairs, GET only.
    pub query: Vec<(String, String)>,
    /// JSON body, POST only, already serialized.
    pub body: Option<Value>,
}

/// Raw transport-level response, before classification.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Connectivity-level failure (refused, reset, timeout). Always transient.
#[derive(Debug, thiserror::Error)]
#[error("connection failed: {0}")]
pub struct ConnectFailure(pub String);

/// Seam between the request core and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: WireRequest) -> Result<WireResponse, ConnectFailure>;
}

/// Production transport backed by reqwest, with the fixed header set and
/// the configured connect/read timeouts.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Self {
        // Same panic semantics as reqwest::Client::new: only fails if the
        // TLS backend cannot initialize.
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: WireRequest) -> Result<WireResponse, ConnectFailure> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.query),
            Method::Post => {
                let builder = self.client.post(&request.url);
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };

        let response = builder
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ConnectFailure(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ConnectFailure(e.to_string()))?
            .to_vec();

        Ok(WireResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted transport shared by the request-core unit tests.

    use std::sync::{Arc, Mutex};

    use super::*;

    /// One scripted transport-level result.
    pub enum Reply {
        /// Respond with a status and a JSON body.
        Json(u16, Value),
        /// Respond with a status and raw bytes.
        Raw(u16, Vec<u8>),
        /// Fail at the connection level.
        Fail,
    }

    /// Pops one reply per request and records everything it was asked to send.
    pub struct MockTransport {
        replies: Mutex<Vec<Reply>>,
        requests: Mutex<Vec<WireRequest>>,
    }

    impl MockTransport {
        pub fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn recorded(&self) -> Vec<WireRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(&self, request: WireRequest) -> Result<WireResponse, ConnectFailure> {
            self.requests.lock().unwrap().push(request);
            let mut replies = self.replies.lock().unwrap();
            assert!(!replies.is_empty(), "mock transport ran out of replies");
            match replies.remove(0) {
                Reply::Json(status, body) => Ok(WireResponse {
                    status,
                    body: serde_json::to_vec(&body).unwrap(),
                }),
                Reply::Raw(status, body) => Ok(WireResponse { status, body }),
                Reply::Fail => Err(ConnectFailure("connection refused".to_string())),
            }
        }
    }
}
