//! Unified error type for the events and geocoding clients.
//!
//! Every outbound call resolves to a `ClientResult`, so callers can use `?`
//! and still tell a dropped connection from a rejected request or a body
//! that did not parse.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure before a response arrived
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{context} (HTTP {status}){}", detail_suffix(.detail))]
    Status {
        status: StatusCode,
        context: String,
        detail: Option<String>,
    },

    /// Response body was not the JSON we expected
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Payload rejected before it was sent
    #[error("Invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Lookup panicked instead of returning
    #[error("Location lookup crashed: {0}")]
    Crashed(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

impl ClientError {
    pub fn status(status: StatusCode, context: impl Into<String>, detail: Option<String>) -> Self {
        ClientError::Status {
            status,
            context: context.into(),
            detail,
        }
    }

    /// True when the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Result type alias for client calls
pub type ClientResult<T> = Result<T, ClientError>;
