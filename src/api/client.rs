//! Transport core: target routing, fixed headers, bounded retry.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::response::{Outcome, classify};
use crate::api::transport::{Method, Transport, WireRequest};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// URL namespace a call is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Production,
    Dev,
}

impl Mode {
    /// Namespace segment used in the route template.
    pub fn namespace(self) -> &'static str {
        match self {
            Mode::Production => "app",
            Mode::Dev => "dev",
        }
    }
}

/// Identity of the running worker instance. Immutable for the session.
#[derive(Debug, Clone)]
pub struct Identity {
    pub instance_key: String,
    pub mode: Mode,
}

/// Low-level API client.
///
/// Builds `{root}/{mode}Api/{instance_key}/{target}/` endpoints and runs
/// every call through a bounded retry loop: connection failures and HTTP 503
/// consume one attempt each, separated by a fixed delay; everything else is
/// terminal on the first attempt.
pub struct ApiClient {
    identity: Identity,
    config: ApiConfig,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(identity: Identity, config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            identity,
            config,
            transport,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Build the endpoint for `target`. An override replaces only the root.
    pub fn endpoint(&self, target: &str, mode: Mode, url_override: Option<&str>) -> String {
        let root = url_override.unwrap_or(&self.config.api_root);
        format!(
            "{}/{}Api/{}/{}/",
            root,
            mode.namespace(),
            self.identity.instance_key,
            target
        )
    }

    /// GET `target` with query arguments, in the session's namespace.
    pub async fn get(
        &self,
        target: &str,
        query: Vec<(String, String)>,
        url_override: Option<&str>,
    ) -> Result<Value, ApiError> {
        let request = WireRequest {
            method: Method::Get,
            url: self.endpoint(target, self.identity.mode, url_override),
            query,
            body: None,
        };
        self.send(request).await
    }

    /// POST a JSON payload to `target`, in the session's namespace.
    pub async fn post<T>(
        &self,
        target: &str,
        payload: &T,
        url_override: Option<&str>,
    ) -> Result<Value, ApiError>
    where
        T: Serialize + ?Sized,
    {
        self.post_in_mode(self.identity.mode, target, payload, url_override)
            .await
    }

    /// POST to `target` in an explicit namespace. Dev-setup calls route
    /// through `dev` even when the session itself is in production mode.
    pub async fn post_in_mode<T>(
        &self,
        mode: Mode,
        target: &str,
        payload: &T,
        url_override: Option<&str>,
    ) -> Result<Value, ApiError>
    where
        T: Serialize + ?Sized,
    {
        // Serialize before the first attempt: a malformed payload cannot be
        // fixed by retrying.
        let body = serde_json::to_value(payload)
            .map_err(|e| ApiError::PayloadNotSerializable(e.to_string()))?;
        let request = WireRequest {
            method: Method::Post,
            url: self.endpoint(target, mode, url_override),
            query: Vec::new(),
            body: Some(body),
        };
        self.send(request).await
    }

    /// Run one logical call through the retry loop.
    ///
    /// Iterative with an explicit attempt counter; a budget of 0 fails
    /// without ever touching the wire, and no sleep follows the last attempt.
    async fn send(&self, request: WireRequest) -> Result<Value, ApiError> {
        let max = self.config.max_connect_retries;
        for attempt in 0..max {
            match self.transport.execute(request.clone()).await {
                Ok(raw) => match classify(&raw) {
                    Outcome::Success(body) => return Ok(body),
                    Outcome::Invalid => return Err(ApiError::InvalidResponse),
                    Outcome::Application(message) => return Err(ApiError::Application(message)),
                    Outcome::Busy => {
                        debug!(url = %request.url, attempt, "server busy, will retry");
                    }
                },
                Err(failure) => {
                    debug!(url = %request.url, attempt, %failure, "connection failed, will retry");
                }
            }
            if attempt + 1 < max {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }
        warn!(url = %request.url, attempts = max, "retry budget exhausted");
        Err(ApiError::ConnectivityExhausted)
    }
}
