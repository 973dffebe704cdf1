//! Error types for the transport boundary and the synchronization engine.

use std::fmt;
use std::time::Duration;

/// Failure of a single outbound call to the feedback service or an AI provider.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS or protocol failure before a status was received.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The remote side answered with a non-2xx status.
    #[error("{endpoint} returned {status}: {detail}")]
    Status {
        endpoint: String,
        status: u16,
        detail: String,
    },
    /// The body could not be decoded into the expected shape.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
    /// The body decoded but is missing what the caller needs.
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
    #[error("{endpoint} did not answer within {after:?}")]
    Timeout { endpoint: String, after: Duration },
}

impl TransportError {
    pub(crate) fn status(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        TransportError::Status {
            endpoint: endpoint.into(),
            status,
            detail: extract_detail(body),
        }
    }

    /// The human-readable reason the remote side gave, if it gave one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            TransportError::Status { detail, .. } if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }
}

/// Pull a readable message out of an error body.
///
/// Understands `{"detail": "..."}`, validation lists of the form
/// `{"detail": [{"msg": "..."}]}` and `{"error": {"message": "..."}}`.
/// Anything else is returned verbatim.
pub fn extract_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(s)) => return s.clone(),
        Some(serde_json::Value::Array(entries)) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(|m| m.as_str()))
                .collect();
            if !messages.is_empty() {
                return messages.join("; ");
            }
        }
        _ => {}
    }

    if let Some(message) = value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return message.to_string();
    }

    body.trim().to_string()
}

/// Which engine operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FetchFailed,
    CreateFailed,
    UpdateFailed,
    DeleteFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorKind::FetchFailed => "Failed to fetch feedback",
            ErrorKind::CreateFailed => "Failed to create feedback",
            ErrorKind::UpdateFailed => "Failed to update feedback",
            ErrorKind::DeleteFailed => "Failed to delete feedback",
        };
        f.write_str(message)
    }
}

/// The engine's most recent failure: what was attempted and why it failed.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {source}")]
pub struct SyncError {
    kind: ErrorKind,
    source: TransportError,
}

impl SyncError {
    pub fn new(kind: ErrorKind, source: TransportError) -> Self {
        Self { kind, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn transport(&self) -> &TransportError {
        &self.source
    }

    /// Text for a dismissible banner: the service's own reason when it sent
    /// one, otherwise a generic line for the failed operation.
    pub fn banner(&self) -> String {
        match self.source.detail() {
            Some(detail) => detail.to_string(),
            None => self.kind.to_string(),
        }
    }
}
