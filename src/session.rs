//! High-level session facade mapping worker operations onto the request core.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::{
    ApiClient, HttpTransport, Identity, Mode, Mutations, Transport, poll_until_ready,
    submit_mutations,
};
use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::storage::{BlobTransport, FileStore, HttpBlobTransport};

/// A task assignment handed down by the server: either a run or a kill.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunAssignment {
    pub func: Option<String>,
    pub inputs: Option<Value>,
    pub role: Option<String>,
}

/// Callback URL issued for external webhooks, plus its retrieval key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackUrl {
    pub url: Option<String>,
    pub key: Option<String>,
}

/// Client session for one worker instance.
///
/// The instance key and mode are fixed at construction; every operation maps
/// 1:1 onto a platform target and shares the session's retry configuration.
pub struct TaskBridge {
    client: ApiClient,
    store: FileStore,
    url_override: Option<String>,
}

impl TaskBridge {
    /// Create a session with the default configuration.
    pub fn new(instance_key: impl Into<String>, mode: Mode) -> Self {
        Self::with_config(instance_key, mode, ApiConfig::default())
    }

    pub fn with_config(instance_key: impl Into<String>, mode: Mode, config: ApiConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(&config));
        Self::with_transports(
            instance_key,
            mode,
            config,
            transport,
            Arc::new(HttpBlobTransport::new()),
        )
    }

    /// Build a session over explicit transports. Tests inject mocks here.
    pub fn with_transports(
        instance_key: impl Into<String>,
        mode: Mode,
        config: ApiConfig,
        transport: Arc<dyn Transport>,
        blob_transport: Arc<dyn BlobTransport>,
    ) -> Self {
        let identity = Identity {
            instance_key: instance_key.into(),
            mode,
        };
        Self {
            client: ApiClient::new(identity, config, transport),
            store: FileStore::with_transport(blob_transport),
            url_override: None,
        }
    }

    /// Route every call through an alternate API root.
    pub fn with_url_override(mut self, root: impl Into<String>) -> Self {
        self.url_override = Some(root.into());
        self
    }

    fn root(&self) -> Option<&str> {
        self.url_override.as_deref()
    }

    /// Register the function to call on the next dev run. Always routed
    /// through the dev namespace, whatever the session mode.
    pub async fn setup_dev_run(&self, func: &str) -> Result<()> {
        self.client
            .post_in_mode(Mode::Dev, "setup_dev_run", &json!({"func": func}), self.root())
            .await?;
        Ok(())
    }

    /// Block until the server assigns a task (a run or a kill), polling at
    /// the configured interval.
    pub async fn begin_run(&self) -> Result<RunAssignment> {
        let body = poll_until_ready(&self.client, "begin_run", self.root()).await?;
        let assignment: RunAssignment =
            serde_json::from_value(body).map_err(|_| ApiError::InvalidResponse)?;
        info!(func = ?assignment.func, role = ?assignment.role, "task assigned");
        Ok(assignment)
    }

    /// Fetch a webhook callback URL and its retrieval key.
    pub async fn find_callback_url(&self) -> Result<CallbackUrl> {
        let body = self
            .client
            .get("find_callback_url", Vec::new(), self.root())
            .await?;
        let callback = serde_json::from_value(body).map_err(|_| ApiError::InvalidResponse)?;
        Ok(callback)
    }

    /// Fetch whatever was posted to a callback URL, if anything yet.
    pub async fn callback_url_results(&self, url_key: &str) -> Result<Option<Value>> {
        let body = self
            .client
            .get(
                "callback_url_results",
                vec![("url_key".to_string(), url_key.to_string())],
                self.root(),
            )
            .await?;
        Ok(body.get("data").filter(|v| !v.is_null()).cloned())
    }

    /// Read rows from a db table. `is_global` selects the table shared
    /// between users of the same tool.
    pub async fn db_read(&self, table: i64, query: &Value, is_global: bool) -> Result<Vec<Value>> {
        let body = self
            .client
            .post(
                "db_read",
                &json!({"table": table, "query": query, "is_global": is_global}),
                self.root(),
            )
            .await?;
        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Upload a local file to storage and return its retrieval key. Files
    /// are dropped after 24 hours unless `is_perm` is set.
    pub async fn file_upload(&self, path: &Path, is_perm: bool) -> Result<Option<String>> {
        let body = self
            .client
            .get(
                "request_file_upload",
                vec![("is_perm".to_string(), is_perm.to_string())],
                self.root(),
            )
            .await?;
        let url = body.get("url").and_then(Value::as_str).unwrap_or_default();
        self.store.upload(url, path).await?;
        Ok(body
            .get("file_key")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Delete a permanent file by key.
    pub async fn del_perm_file(&self, file_key: &str) -> Result<()> {
        self.client
            .post("del_perm_file", &json!({"file_key": file_key}), self.root())
            .await?;
        Ok(())
    }

    /// Fetch a one-hour download link for a stored file. `is_perm` must
    /// match the value used at upload time.
    pub async fn file_download_link(
        &self,
        file_key: &str,
        name: &str,
        is_perm: bool,
    ) -> Result<Option<String>> {
        let body = self
            .client
            .get(
                "file_download_link",
                vec![
                    ("is_perm".to_string(), is_perm.to_string()),
                    ("name".to_string(), name.to_string()),
                    ("file_key".to_string(), file_key.to_string()),
                ],
                self.root(),
            )
            .await?;
        Ok(body
            .get("file_link")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Report a fatal error to the server; the server then shuts the
    /// container down.
    pub async fn report_error(&self, error_message: &str) -> Result<()> {
        self.client
            .post(
                "report_error",
                &json!({"error_message": error_message}),
                self.root(),
            )
            .await?;
        Ok(())
    }

    /// End the current run, flushing pending db mutations first. After this
    /// returns the worker should call [`begin_run`](Self::begin_run) again.
    pub async fn end_run(
        &self,
        message: &str,
        link: &str,
        continue_run: bool,
        mutations: Mutations,
    ) -> Result<()> {
        if !mutations.is_empty() {
            submit_mutations(&self.client, mutations, self.root()).await?;
        }
        self.client
            .post(
                "end_run",
                &json!({"message": message, "link": link, "continue_run": continue_run}),
                self.root(),
            )
            .await?;
        Ok(())
    }
}
