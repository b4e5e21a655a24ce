//! Process-wide session registry.
//!
//! Maps game codes to live sessions. Entries are only ever inserted,
//! never overwritten; by default they live for the process lifetime,
//! which matches the deployment scale this server targets. An optional
//! idle sweep is available for operators who want the hygiene.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::SessionError;
use crate::session::{GameSession, GameSettings};
use crate::types::GameCode;

/// One registry slot: the session behind its serializing lock, plus the
/// last-activity stamp the idle sweep reads.
pub struct SessionEntry {
    /// All mutation goes through this lock; it is the at-most-one-writer
    /// guarantee for the whole session.
    pub session: Mutex<GameSession>,
    last_activity: StdMutex<Instant>,
}

impl SessionEntry {
    fn new(session: GameSession) -> Self {
        Self {
            session: Mutex::new(session),
            last_activity: StdMutex::new(Instant::now()),
        }
    }

    /// Refreshes the idle stamp. Called by the router on every event that
    /// addresses this session.
    pub fn touch(&self) {
        if let Ok(mut stamp) = self.last_activity.lock() {
            *stamp = Instant::now();
        }
    }

    /// Time since the session last saw an event.
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .map(|stamp| stamp.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

impl std::fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEntry")
            .field("idle_for", &self.idle_for())
            .finish_non_exhaustive()
    }
}

/// Mapping from game code to [`SessionEntry`].
///
/// The map itself is a [`DashMap`] so distinct sessions never contend;
/// per-session serialization lives inside each entry.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<GameCode, Arc<SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new session under a freshly generated code.
    ///
    /// Codes are random enough that collisions are negligible, but a
    /// colliding code is regenerated rather than trusted: an existing
    /// entry is never overwritten.
    pub fn create(&self, settings: GameSettings) -> Result<Arc<SessionEntry>, SessionError> {
        loop {
            let code = GameCode::generate();
            match self.sessions.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let session = GameSession::new(code, settings.clone())?;
                    let entry = Arc::new(SessionEntry::new(session));
                    slot.insert(Arc::clone(&entry));
                    return Ok(entry);
                }
            }
        }
    }

    /// Looks up a session by code.
    pub fn get(&self, code: &str) -> Result<Arc<SessionEntry>, SessionError> {
        self.sessions
            .get(&GameCode::from(code))
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound(code.to_string()))
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Evicts sessions idle longer than `max_idle` and returns how many
    /// were dropped. Only called when the operator opted into the sweep.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|code, entry| {
            let keep = entry.idle_for() <= max_idle;
            if !keep {
                info!("🧹 Evicting idle game {code}");
            }
            keep
        });
        before - self.sessions.len()
    }
}
