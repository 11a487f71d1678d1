//! Configuration types.

use std::time::Duration;

/// API and connectivity settings for a session.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root URL for the platform API.
    pub api_root: String,
    /// Maximum attempts for one logical call before giving up on connectivity.
    pub max_connect_retries: u32,
    /// Fixed delay between connectivity retries (no backoff growth).
    pub retry_delay: Duration,
    /// Sleep between task polls while the server reports `wait`.
    pub poll_interval: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Read timeout for a whole request.
    pub read_timeout: Duration,
    /// Maximum number of db mutations of one kind per request.
    pub max_batch_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_root: "https://containers.taskbridge.io".to_string(),
            max_connect_retries: 3,
            retry_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(2),
            connect_timeout: Duration::from_millis(3050),
            read_timeout: Duration::from_secs(120),
            max_batch_size: 1000,
        }
    }
}
