//! Error types for the taskbridge SDK.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from the platform API request path.
///
/// Only transient conditions (connection failures, HTTP 503) are absorbed by
/// the retry loop; everything here is terminal for the current call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connectivity failed past the retry budget.
    #[error("Unable to connect to the server")]
    ConnectivityExhausted,

    /// The server returned a non-JSON or malformed body.
    #[error("Invalid server response")]
    InvalidResponse,

    /// The server signalled a logical failure (status > 200) with a message.
    #[error("{0}")]
    Application(String),

    /// The request body could not be encoded as JSON. Never retried.
    #[error("Payload not serializable: {0}")]
    PayloadNotSerializable(String),
}

/// Errors from the file storage path. None of these are retried here; callers
/// re-request an upload URL and start over.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The local file was missing or unreadable. No network call was made.
    #[error("Invalid file path: {}", .0.display())]
    InvalidFilePath(std::path::PathBuf),

    /// Network failure while reaching the storage backend.
    #[error("Unable to connect to file server: {0}")]
    Unavailable(String),

    /// The storage backend rejected the upload with a non-2xx status.
    #[error("Failed to store file (status {0})")]
    UploadFailed(u16),
}

/// Result type alias for the SDK.
pub type Result<T> = std::result::Result<T, Error>;
