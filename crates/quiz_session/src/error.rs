//! Session-level error types.
//!
//! Guard violations (wrong team clicking, duplicate reveal, index out of
//! range) are deliberately *not* errors: they are silent no-ops expressed
//! as `Option`/`None` returns on the session itself, matching the
//! "button simply does nothing" UX.

use thiserror::Error;

/// Errors surfaced to a single requesting connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed creation payload, e.g. a team count outside `[1, 4]`.
    /// No session is produced.
    #[error("Invalid game settings: {0}")]
    Validation(String),

    /// Unknown game code. Reported to the requester only; the registry is
    /// left untouched and nothing is broadcast.
    #[error("Game not found")]
    NotFound(String),
}
