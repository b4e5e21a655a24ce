//! # Quiz Session Core
//!
//! In-memory session, turn, and scoring state machine for a team trivia
//! party game. This crate owns everything that must stay consistent when
//! several connections poke at the same room concurrently:
//!
//! * **[`GameSession`]** - all mutable state for one room: teams, scores,
//!   the round-robin turn pointer, the active question, and which answers
//!   have already been revealed. Pure state + transition logic, no I/O.
//! * **[`SessionRegistry`]** - process-wide map from game code to session,
//!   with collision-safe code generation and optional idle eviction.
//! * **[`QuestionProvider`]** - the contract for the external question
//!   store. The store is a read-only random-question source keyed by
//!   difficulty labels; everything else about it is opaque to this crate.
//! * Wire event types ([`events`]) and the full-state [`SessionSnapshot`]
//!   that is rebroadcast to a room after every mutation.
//!
//! ## Concurrency contract
//!
//! Every session lives behind its own `tokio::sync::Mutex` inside the
//! registry. All mutation goes through that lock, so two simultaneous
//! reveals of the same answer can never double-count and two simultaneous
//! joins can never pick teams from a stale roster. Distinct sessions share
//! nothing and proceed fully in parallel.
//!
//! The only await point under a session lock is the single
//! [`QuestionProvider`] call made by [`load_next_question`]. Turn counters
//! advance *before* that call, so a store failure leaves the session in a
//! well-defined state: counters moved on, question payload stale, game
//! degraded but alive.

pub mod error;
pub mod events;
pub mod question;
pub mod registry;
pub mod session;
pub mod types;

pub use error::SessionError;
pub use question::{
    load_next_question, Answer, MemoryQuestionProvider, ProviderError, Question, QuestionProvider,
};
pub use registry::{SessionEntry, SessionRegistry};
pub use session::{
    GameSession, GameSettings, Reveal, SessionSnapshot, TurnPhase, DEFAULT_ROUNDS, MAX_TEAMS,
};
pub use types::{GameCode, PlayerId};
