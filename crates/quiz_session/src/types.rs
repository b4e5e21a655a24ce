//! Core identifier types.
//!
//! Wrapper types prevent the two identities in the system from being
//! confused: a [`GameCode`] names a room, a [`PlayerId`] names one
//! connection's seat in a room.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of random bytes behind a generated game code. Six bytes encode
/// to eight URL-safe characters, short enough to read out loud across a
/// living room.
const CODE_BYTES: usize = 6;

/// Opaque room identifier handed to players when a game is created.
///
/// Codes are generated from CSPRNG output and base64url-encoded without
/// padding, so they are safe to embed in URLs and chat messages. They are
/// immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCode(String);

impl GameCode {
    /// Generates a fresh random code.
    ///
    /// Uniqueness is probabilistic; [`SessionRegistry`](crate::SessionRegistry)
    /// retries on the (negligible) chance of a collision with a live room.
    pub fn generate() -> Self {
        let mut bytes = [0u8; CODE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GameCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for GameCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one connected participant.
///
/// Assigned when a connection is accepted and used as the key for team
/// membership inside a session. A reconnecting client gets a new
/// `PlayerId`; the old mapping is retained (best-effort re-assignment is
/// a non-goal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
