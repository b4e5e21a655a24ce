//! # Question Store
//!
//! PostgreSQL-backed [`QuestionProvider`] for the Quizhall trivia server.
//!
//! The store is read-only from the server's point of view: one random
//! question matching the room's difficulty filter, then its answers in
//! display order. Store failures are surfaced as
//! [`ProviderError`](quiz_session::ProviderError) and the session core
//! degrades gracefully - a broken database stalls question loading but
//! never takes a game down.
//!
//! Expected schema:
//!
//! ```sql
//! questions (id SERIAL PRIMARY KEY, question_text TEXT, difficulty_label TEXT)
//! answers   (question_id INTEGER, answer_text TEXT, difficulty_score INTEGER,
//!            display_order INTEGER)
//! ```

mod provider;

pub use provider::{connect_with_retry, PgQuestionProvider};
