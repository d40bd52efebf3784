//! Error taxonomy for backend interactions.
//!
//! Read failures ([`UpstreamError`]) and write failures ([`ActionError`])
//! propagate differently: reads are absorbed locally (stale data beats no
//! data), writes are always surfaced to whoever initiated the action. Both
//! enums are transport-agnostic so the queue state machine can be tested
//! against an in-memory store.

/// A failure while reading from the backend (page fetch, count probe,
/// dialog lookup).
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body did not match the expected JSON shape.
    #[error("Malformed backend response: {0}")]
    Decode(String),
}

/// A failure while writing to the backend (approve, reject, visibility).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActionError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The backend rejected the action with a non-2xx status code.
    #[error("Backend action error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ActionError {
    /// HTTP status the backend answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ActionError::Api { status, .. } => Some(*status),
            ActionError::Request(_) => None,
        }
    }
}
