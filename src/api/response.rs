//! Response classification for platform API calls.

use serde_json::Value;

use crate::api::transport::WireResponse;

/// Classified outcome of one HTTP exchange with the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// HTTP 200 with a JSON body. The only tag that carries data forward.
    Success(Value),
    /// HTTP 503 — the server asked us to back off. Takes the same retry
    /// path as a connection failure.
    Busy,
    /// The body was not valid JSON, or an error body had no message.
    Invalid,
    /// The server reported a logical failure with a message.
    Application(String),
}

/// Classify a raw response.
///
/// Strict by contract: only status 200 is success, so 201+ is an application
/// error. The storage path has its own, looser 2xx rule — the two are
/// deliberately distinct and must stay that way.
pub fn classify(response: &WireResponse) -> Outcome {
    if response.status == 503 {
        return Outcome::Busy;
    }

    let Ok(body) = serde_json::from_slice::<Value>(&response.body) else {
        return Outcome::Invalid;
    };

    if response.status > 200 {
        return match body.get("message").and_then(Value::as_str) {
            Some(message) => Outcome::Application(message.to_string()),
            None => Outcome::Invalid,
        };
    }

    Outcome::Success(body)
}
