//! Splits oversized db mutation lists into bounded `save_data` requests.

use serde_json::{Value, json};
use tracing::debug;

use crate::api::client::ApiClient;
use crate::error::ApiError;

const SAVE_TARGET: &str = "save_data";

/// Pending db mutations for one run, in submission order.
///
/// Every call site constructs its own fresh value; mutation lists are never
/// shared between calls.
#[derive(Debug, Clone, Default)]
pub struct Mutations {
    pub creates: Vec<Value>,
    pub updates: Vec<Value>,
    pub deletes: Vec<Value>,
}

impl Mutations {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Submit mutations, keeping each kind under `max_batch_size` per request.
///
/// Each kind is chunked independently: while a list is over the ceiling, a
/// prefix of exactly `max_batch_size` entries goes out as a request holding
/// only that one key. The final request always carries the three remainders
/// together, even when all are empty, so the server sees a closing combined
/// batch. A failed chunk aborts the rest; chunks already sent are not rolled
/// back, so partial application is possible.
pub async fn submit_mutations(
    client: &ApiClient,
    mut mutations: Mutations,
    url_override: Option<&str>,
) -> Result<(), ApiError> {
    // A ceiling below 1 could never drain anything.
    let max = client.config().max_batch_size.max(1);

    let kinds: [(&str, &mut Vec<Value>); 3] = [
        ("db_creates", &mut mutations.creates),
        ("db_updates", &mut mutations.updates),
        ("db_deletes", &mut mutations.deletes),
    ];
    for (key, entries) in kinds {
        while entries.len() > max {
            let chunk: Vec<Value> = entries.drain(..max).collect();
            debug!(kind = key, len = chunk.len(), "submitting mutation chunk");
            client
                .post(SAVE_TARGET, &json!({ key: chunk }), url_override)
                .await?;
        }
    }

    client
        .post(
            SAVE_TARGET,
            &json!({
                "db_creates": mutations.creates,
                "db_updates": mutations.updates,
                "db_deletes": mutations.deletes,
            }),
            url_override,
        )
        .await?;
    Ok(())
}
