//! The per-room game session state machine.
//!
//! A session moves through four phases: lobby (created, not started),
//! in-round (question active), round-over (all answers revealed, waiting
//! for an advance), and game-over (turn counter past the last round).
//! `restart` loops back to the start of a fresh game with the same teams
//! and settings.
//!
//! Scoring model: the team whose turn it is *guesses out loud*; the other
//! teams operate the board. Revealing an answer credits its points to the
//! guessing team, which is why the guessing team itself is barred from
//! revealing or advancing - one shared guard covers both operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::question::Question;
use crate::types::{GameCode, PlayerId};

/// Highest supported team count; also the fixed length of the color and
/// score arrays so clients can index 0..3 unconditionally.
pub const MAX_TEAMS: usize = 4;

/// Rounds played when the creator does not specify a count.
pub const DEFAULT_ROUNDS: u32 = 5;

/// Fallback palette used to pad caller-supplied colors out to
/// [`MAX_TEAMS`] entries.
const FALLBACK_COLORS: [&str; MAX_TEAMS] = ["#3498db", "#e74c3c", "#f39c12", "#27ae60"];

/// Creation parameters for a session, as supplied by the game creator.
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Number of teams, must be in `[1, MAX_TEAMS]`.
    pub team_count: usize,
    /// Display names; truncated or padded to `team_count`.
    pub team_names: Vec<String>,
    /// Display colors; truncated to `team_count`, then padded to
    /// [`MAX_TEAMS`] from the fallback palette.
    pub team_colors: Vec<String>,
    /// Difficulty labels a question must match to be selected.
    pub difficulties: Vec<String>,
    /// Turns each team gets over the whole game; `0` means the default.
    pub total_rounds: u32,
}

/// Result of advancing the turn counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// A new turn started; the caller should fetch a question.
    NeedQuestion,
    /// The counter moved past the final turn; no question is loaded.
    GameOver,
}

/// A successful reveal: which answer flipped and what it was worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub index: usize,
    pub points: i32,
}

/// Full room state as broadcast to every participant after any mutation.
///
/// Snapshots are complete rather than incremental: every broadcast fully
/// resynchronizes every client, which removes an entire class of desync
/// bugs at the cost of some bandwidth. Field names match the wire format
/// clients already speak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub game_id: String,
    pub num_teams: usize,
    pub team_names: Vec<String>,
    pub team_colors: Vec<String>,
    pub team_scores: [i32; MAX_TEAMS],
    pub current_team: usize,
    pub question_num: u32,
    pub total_rounds: u32,
    pub question_text: String,
    pub answers: Vec<(String, i32)>,
    pub revealed: Vec<usize>,
    pub started: bool,
}

/// All mutable state for one game room.
///
/// Pure state + transition logic: no I/O, no locking. Callers serialize
/// access through the registry's per-session mutex.
#[derive(Debug)]
pub struct GameSession {
    code: GameCode,
    team_count: usize,
    team_names: Vec<String>,
    team_colors: Vec<String>,
    team_scores: [i32; MAX_TEAMS],
    total_rounds: u32,
    difficulties: Vec<String>,
    /// Turn counter across the whole game: 0 before the first question,
    /// then 1, 2, 3, ... Only ever increases (until restart).
    question_number: u32,
    /// Always derived as `(question_number - 1) % team_count`, never set
    /// independently.
    current_team: usize,
    current_question: Option<Question>,
    /// Answer positions already revealed this turn, in reveal order.
    revealed: Vec<usize>,
    started: bool,
    /// Connection identity -> team index. Entries are never removed;
    /// a stale mapping from a dropped connection is an accepted leak.
    members: HashMap<PlayerId, usize>,
}

impl GameSession {
    /// Builds a new session in the lobby phase.
    ///
    /// Validates the team count, truncates/pads names to `team_count`
    /// (missing names become `Team N`), and pads colors from the fallback
    /// palette so the color list is always exactly [`MAX_TEAMS`] long.
    pub fn new(code: GameCode, settings: GameSettings) -> Result<Self, SessionError> {
        let GameSettings {
            team_count,
            team_names,
            team_colors,
            difficulties,
            total_rounds,
        } = settings;

        if team_count < 1 || team_count > MAX_TEAMS {
            return Err(SessionError::Validation(format!(
                "team count must be between 1 and {MAX_TEAMS}, got {team_count}"
            )));
        }

        let mut names: Vec<String> = team_names.into_iter().take(team_count).collect();
        while names.len() < team_count {
            names.push(format!("Team {}", names.len() + 1));
        }

        let mut colors: Vec<String> = team_colors.into_iter().take(team_count).collect();
        while colors.len() < MAX_TEAMS {
            colors.push(FALLBACK_COLORS[colors.len()].to_string());
        }

        Ok(Self {
            code,
            team_count,
            team_names: names,
            team_colors: colors,
            team_scores: [0; MAX_TEAMS],
            total_rounds: if total_rounds == 0 { DEFAULT_ROUNDS } else { total_rounds },
            difficulties,
            question_number: 0,
            current_team: 0,
            current_question: None,
            revealed: Vec::new(),
            started: false,
            members: HashMap::new(),
        })
    }

    pub fn code(&self) -> &GameCode {
        &self.code
    }

    pub fn difficulties(&self) -> &[String] {
        &self.difficulties
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// Total turns in the game: each team guesses once per round.
    pub fn total_questions(&self) -> u32 {
        self.total_rounds * self.team_count as u32
    }

    /// True once the turn counter has moved past the final turn.
    pub fn is_over(&self) -> bool {
        self.question_number > self.total_questions()
    }

    /// The shared guard for reveal and advance: the team currently
    /// guessing may not operate the board.
    pub fn may_act(&self, team: usize) -> bool {
        team != self.current_team
    }

    /// Team index a connection plays for; unmapped connections act as
    /// team 0.
    pub fn team_of(&self, player: PlayerId) -> usize {
        self.members.get(&player).copied().unwrap_or(0)
    }

    /// Display name of a team. `team` must be below the team count.
    pub fn team_name(&self, team: usize) -> &str {
        &self.team_names[team]
    }

    /// Assigns a connection to a team and records the membership.
    ///
    /// Already-mapped connections keep their team. Otherwise the lowest
    /// team index without a member is chosen; when every team has at
    /// least one member the connection lands on team 0 (oversubscription
    /// is allowed - teams may be shared).
    pub fn assign(&mut self, player: PlayerId) -> usize {
        if let Some(&team) = self.members.get(&player) {
            return team;
        }
        let team = (0..self.team_count)
            .find(|candidate| !self.members.values().any(|&taken| taken == *candidate))
            .unwrap_or(0);
        self.members.insert(player, team);
        team
    }

    /// Occupied-team roster for the `player_joined` broadcast:
    /// team index -> team name, for every team with at least one member.
    pub fn roster(&self) -> std::collections::BTreeMap<usize, String> {
        self.members
            .values()
            .map(|&team| (team, self.team_names[team].clone()))
            .collect()
    }

    /// Marks the game started. The caller is expected to load the first
    /// question immediately afterwards; calling `start` again re-runs
    /// that load and therefore burns a turn (kept as-is).
    pub fn start(&mut self) {
        self.started = true;
    }

    /// Resets the session for a replay with the same teams and settings:
    /// all score slots to zero, turn counter to zero, question and
    /// reveals cleared, game marked started.
    pub fn restart(&mut self) {
        self.team_scores = [0; MAX_TEAMS];
        self.question_number = 0;
        self.current_team = 0;
        self.current_question = None;
        self.revealed.clear();
        self.started = true;
    }

    /// Advances the turn counter and recomputes whose turn it is.
    ///
    /// Returns [`TurnPhase::GameOver`] once the counter passes the final
    /// turn; in that case the question fields are left exactly as they
    /// were and the provider must not be consulted.
    pub fn begin_turn(&mut self) -> TurnPhase {
        self.question_number += 1;
        self.current_team = (self.question_number as usize - 1) % self.team_count;
        if self.question_number > self.total_questions() {
            TurnPhase::GameOver
        } else {
            TurnPhase::NeedQuestion
        }
    }

    /// Installs a freshly fetched question and resets the reveal set.
    pub fn install_question(&mut self, question: Question) {
        self.current_question = Some(question);
        self.revealed.clear();
    }

    /// Reveals an answer on behalf of `team`, crediting its points to the
    /// currently guessing team.
    ///
    /// Returns `None` - silently, with no state change - when the guard
    /// fails: the guessing team itself is clicking, the index was already
    /// revealed, no question is loaded, or the index is out of range.
    pub fn reveal_answer(&mut self, team: usize, index: usize) -> Option<Reveal> {
        if !self.may_act(team) {
            return None;
        }
        let question = self.current_question.as_ref()?;
        if self.revealed.contains(&index) || index >= question.answers.len() {
            return None;
        }
        let points = question.answers[index].points;
        self.revealed.push(index);
        self.team_scores[self.current_team] += points;
        Some(Reveal { index, points })
    }

    /// Full-state snapshot for broadcast.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_id: self.code.to_string(),
            num_teams: self.team_count,
            team_names: self.team_names.clone(),
            team_colors: self.team_colors.clone(),
            team_scores: self.team_scores,
            current_team: self.current_team,
            question_num: self.question_number,
            total_rounds: self.total_rounds,
            question_text: self
                .current_question
                .as_ref()
                .map(|q| q.text.clone())
                .unwrap_or_default(),
            answers: self
                .current_question
                .as_ref()
                .map(|q| q.answers.iter().map(|a| (a.text.clone(), a.points)).collect())
                .unwrap_or_default(),
            revealed: self.revealed.clone(),
            started: self.started,
        }
    }
}
