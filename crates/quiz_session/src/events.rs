//! Wire event types.
//!
//! Every frame on the room channel is an envelope `{event, data}`. This
//! module defines the envelope, the payloads of the six inbound client
//! events, and the payloads of the outbound events the server emits.
//! Field names are the wire contract and must not drift.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::session::{SessionSnapshot, DEFAULT_ROUNDS};

// Inbound event names.
pub const CREATE_GAME: &str = "create_game";
pub const JOIN_GAME: &str = "join_game";
pub const START_GAME: &str = "start_game";
pub const RESTART_GAME: &str = "restart_game";
pub const REVEAL_ANSWER: &str = "reveal_answer";
pub const NEXT_QUESTION: &str = "next_question";

// Outbound event names.
pub const GAME_CREATED: &str = "game_created";
pub const JOINED_GAME: &str = "joined_game";
pub const PLAYER_JOINED: &str = "player_joined";
pub const GAME_STARTED: &str = "game_started";
pub const ANSWER_REVEALED: &str = "answer_revealed";
pub const QUESTION_LOADED: &str = "question_loaded";
pub const GAME_OVER: &str = "game_over";
pub const ERROR: &str = "error";

/// Generic message envelope, both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name, e.g. `"reveal_answer"`.
    pub event: String,
    /// Event payload; shape depends on the event.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Builds an outbound envelope around a serializable payload.
    pub fn new(event: &str, data: impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_value(data)?,
        })
    }
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS
}

/// `create_game` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGame {
    pub num_teams: usize,
    pub team_names: Vec<String>,
    #[serde(default)]
    pub team_colors: Vec<String>,
    pub difficulties: Vec<String>,
    #[serde(default = "default_rounds")]
    pub total_rounds: u32,
}

/// `join_game`, `start_game`, `restart_game`, and `next_question` all
/// address a room by code and carry nothing else.
#[derive(Debug, Clone, Deserialize)]
pub struct GameRef {
    pub game_id: String,
}

/// `reveal_answer` payload. The index is signed on the wire; anything
/// that is not a valid answer position is treated as a guard violation.
#[derive(Debug, Clone, Deserialize)]
pub struct RevealAnswer {
    pub game_id: String,
    pub answer_index: i64,
}

/// `game_created` / `joined_game` payload.
#[derive(Debug, Clone, Serialize)]
pub struct GameJoined {
    pub game_id: String,
    pub team_index: usize,
    pub state: SessionSnapshot,
}

/// `player_joined` room notification.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerJoined {
    pub team_index: usize,
    pub team_name: String,
    /// Occupied teams: index -> team name.
    pub players: BTreeMap<usize, String>,
}

/// `answer_revealed` room notification.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRevealed {
    pub answer_index: usize,
    pub points: i32,
    pub state: SessionSnapshot,
}

/// `error` payload, sent only to the requesting connection.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}
