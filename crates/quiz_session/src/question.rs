//! Question provider contract and the turn-loading operation.
//!
//! The question store is an external collaborator: given the set of
//! difficulty labels a room allows, it returns one random question with
//! its ordered answers, or nothing. This module defines that contract,
//! an in-memory implementation for tests and store-less runs, and
//! [`load_next_question`], the one operation that touches both the
//! session state machine and the provider.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::session::{GameSession, TurnPhase};

/// One revealable answer on the board: display text plus the points the
/// guessing team earns when it is revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub points: i32,
}

/// A question with its ordered answer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub answers: Vec<Answer>,
}

/// Failure modes of the question store, kept distinct from the ordinary
/// "no question matches this filter" case (`Ok(None)`).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The store could not be reached or the query failed in transit.
    #[error("question store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but the row data was unusable.
    #[error("question store returned malformed data: {0}")]
    Malformed(String),
}

/// Read-only source of random questions, keyed by difficulty label.
///
/// Implementations must distinguish "nothing matched the filter"
/// (`Ok(None)`) from a transient store failure (`Err`); the session core
/// treats both as a stalled turn but logs them differently.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Returns one random question whose difficulty label is in
    /// `difficulties`, with answers in display order.
    async fn fetch_random(&self, difficulties: &[String])
        -> Result<Option<Question>, ProviderError>;
}

/// Advances the turn and loads the next question from `provider`.
///
/// This is the async half of the state machine and the only place a
/// session awaits external I/O. The caller must already hold the
/// session's lock; the counters advance *before* the provider call so a
/// store failure can never leave the turn half-taken:
///
/// * past the final turn, the provider is not consulted at all and the
///   question fields keep their last value (game over);
/// * on `Ok(Some(q))` the question is installed and reveals reset;
/// * on `Ok(None)` or `Err(_)` the failure is logged and the previous
///   question payload is kept - the game proceeds degraded rather than
///   crashing (fail open).
pub async fn load_next_question(
    session: &mut GameSession,
    provider: &dyn QuestionProvider,
) -> TurnPhase {
    match session.begin_turn() {
        TurnPhase::GameOver => TurnPhase::GameOver,
        TurnPhase::NeedQuestion => {
            let fetched = provider.fetch_random(session.difficulties()).await;
            match fetched {
                Ok(Some(question)) => session.install_question(question),
                Ok(None) => warn!(
                    game = %session.code(),
                    "no question matches the difficulty filter, keeping previous question"
                ),
                Err(e) => error!(game = %session.code(), "question store failure: {e}"),
            }
            TurnPhase::NeedQuestion
        }
    }
}

/// In-memory [`QuestionProvider`] backed by a fixed list of
/// `(difficulty label, question)` pairs.
///
/// Used by the test suites and as the fallback provider when the server
/// is started without a question store configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuestionProvider {
    questions: Vec<(String, Question)>,
}

impl MemoryQuestionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small built-in question set so a store-less server is still
    /// playable in demo runs.
    pub fn sample_set() -> Self {
        let mut provider = Self::new();
        provider.push(
            "easy",
            Question {
                text: "Name something people bring to a picnic".to_string(),
                answers: vec![
                    Answer { text: "Sandwiches".to_string(), points: 30 },
                    Answer { text: "A blanket".to_string(), points: 25 },
                    Answer { text: "Drinks".to_string(), points: 20 },
                    Answer { text: "A frisbee".to_string(), points: 10 },
                ],
            },
        );
        provider.push(
            "medium",
            Question {
                text: "Name a reason people are late for work".to_string(),
                answers: vec![
                    Answer { text: "Traffic".to_string(), points: 40 },
                    Answer { text: "Overslept".to_string(), points: 35 },
                    Answer { text: "Kids".to_string(), points: 15 },
                ],
            },
        );
        provider.push(
            "hard",
            Question {
                text: "Name something you would find in a wizard's tower".to_string(),
                answers: vec![
                    Answer { text: "Spellbooks".to_string(), points: 45 },
                    Answer { text: "A crystal ball".to_string(), points: 30 },
                    Answer { text: "Potions".to_string(), points: 15 },
                    Answer { text: "An owl".to_string(), points: 10 },
                ],
            },
        );
        provider
    }

    /// Adds a question under the given difficulty label.
    pub fn push(&mut self, difficulty: &str, question: Question) {
        self.questions.push((difficulty.to_string(), question));
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionProvider for MemoryQuestionProvider {
    async fn fetch_random(
        &self,
        difficulties: &[String],
    ) -> Result<Option<Question>, ProviderError> {
        let matching: Vec<&Question> = self
            .questions
            .iter()
            .filter(|(label, _)| difficulties.iter().any(|d| d == label))
            .map(|(_, q)| q)
            .collect();
        Ok(matching.choose(&mut rand::thread_rng()).map(|q| (*q).clone()))
    }
}
