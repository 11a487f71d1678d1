//! Blocking poll loop for task assignment.

use serde_json::Value;
use tracing::debug;

use crate::api::client::ApiClient;
use crate::error::ApiError;

/// Status the server returns while no task is assigned. Also the default
/// when the field is absent.
const WAIT_STATE: &str = "wait";

/// Poll `target` until the server reports a non-wait state, returning the
/// final response body.
///
/// Blocks the calling task indefinitely, sleeping `poll_interval` between
/// attempts; there is no timeout or cancellation in this contract, so the
/// only failure path is the transport's own retry exhaustion.
pub async fn poll_until_ready(
    client: &ApiClient,
    target: &str,
    url_override: Option<&str>,
) -> Result<Value, ApiError> {
    loop {
        let body = client.get(target, Vec::new(), url_override).await?;
        // Absent counts as wait; any other value, string or not, is terminal.
        let waiting = match body.get("state") {
            None => true,
            Some(state) => state.as_str() == Some(WAIT_STATE),
        };
        if !waiting {
            debug!(target, "poll finished");
            return Ok(body);
        }
        tokio::time::sleep(client.config().poll_interval).await;
    }
}
