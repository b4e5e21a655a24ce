//! Server error types.

use thiserror::Error;

/// Errors scoped to one connection or one request. Nothing here is fatal
/// to the process; the connection handler logs, replies with an `error`
/// event where appropriate, and keeps serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Connection, handshake, or malformed-frame problems.
    #[error("Network error: {0}")]
    Network(String),

    /// Unexpected internal state, e.g. a routed message from a
    /// connection the manager no longer knows.
    #[error("Internal error: {0}")]
    Internal(String),
}
