//! # Quiz Server - WebSocket Room Infrastructure
//!
//! The network-facing half of the Quizhall trivia server. This crate owns
//! connections, rooms, and event routing; all game semantics live in
//! [`quiz_session`].
//!
//! ## Architecture
//!
//! * **Connection management** - every accepted WebSocket gets a
//!   [`ConnectionId`](connection::ConnectionId), a
//!   [`PlayerId`](quiz_session::PlayerId), and an outbound message queue
//!   drained by a dedicated writer task.
//! * **Rooms** - broadcast groups keyed by game code. Joining a game
//!   subscribes the connection to its room; every state-changing event
//!   rebroadcasts the *entire* session snapshot to the room.
//! * **Routing** - inbound frames are `{event, data}` envelopes. The
//!   [`GameRouter`](messaging::GameRouter) parses them, applies the
//!   matching session transition under that session's lock, and emits the
//!   resulting snapshot with the scope the event calls for (requester
//!   only, or whole room).
//! * **Accept loops** - one listener by default, or one per CPU core with
//!   `SO_REUSEPORT` when configured.
//!
//! ## Message Flow
//!
//! 1. Client sends `{"event": "reveal_answer", "data": {...}}`
//! 2. The router parses and validates the envelope
//! 3. The session transition runs under the per-session lock
//! 4. The full-state snapshot is broadcast to the room
//!
//! Guard violations (the guessing team clicking its own board, duplicate
//! reveals, bad indices) are silent: no state change, no broadcast, no
//! error - the click simply has no effect.

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::GameServer;

pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod server;
