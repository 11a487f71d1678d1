//! Request/retry core for the platform API.

pub mod batch;
pub mod client;
pub mod poll;
pub mod response;
pub mod transport;

pub use batch::{Mutations, submit_mutations};
pub use client::{ApiClient, Identity, Mode};
pub use poll::poll_until_ready;
pub use response::Outcome;
pub use transport::{ConnectFailure, HttpTransport, Method, Transport, WireRequest, WireResponse};
