//! taskbridge — worker-side client SDK for the TaskBridge task platform.
//!
//! A worker container polls the platform for assigned work, reads and mutates
//! the remote db, moves files through pre-signed storage URLs, and reports
//! completion or failure. This crate is the request/retry core behind those
//! operations plus a thin session facade ([`TaskBridge`]).

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;

pub use config::ApiConfig;
pub use error::{ApiError, Error, Result, StorageError};
pub use session::{CallbackUrl, RunAssignment, TaskBridge};
