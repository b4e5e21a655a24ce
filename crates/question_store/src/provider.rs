//! PostgreSQL implementation of the question provider.

use async_trait::async_trait;
use quiz_session::{Answer, ProviderError, Question, QuestionProvider};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Connects to the question store, retrying transient failures.
///
/// Mirrors the store's operational reality: on cold starts the database
/// often comes up a beat after the server, so the first attempts may be
/// refused.
pub async fn connect_with_retry(database_url: &str, retries: u32) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                info!("🗄️ Connected to question store (attempt {attempt})");
                return Ok(pool);
            }
            Err(e) if attempt < retries.max(1) => {
                warn!("Question store connection attempt {attempt} failed: {e}, retrying");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Read-only random-question source backed by PostgreSQL.
///
/// `sqlx::PgPool` is internally reference-counted, so the provider is
/// cheap to clone and share across rooms.
#[derive(Debug, Clone)]
pub struct PgQuestionProvider {
    pool: PgPool,
}

impl PgQuestionProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QuestionProvider for PgQuestionProvider {
    async fn fetch_random(
        &self,
        difficulties: &[String],
    ) -> Result<Option<Question>, ProviderError> {
        let question_row = sqlx::query(
            r#"
            SELECT id, question_text
            FROM questions
            WHERE difficulty_label = ANY($1)
            ORDER BY RANDOM()
            LIMIT 1
            "#,
        )
        .bind(difficulties)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let Some(question_row) = question_row else {
            return Ok(None);
        };
        let question_id: i32 = question_row
            .try_get("id")
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let text: String = question_row
            .try_get("question_text")
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let answer_rows = sqlx::query(
            r#"
            SELECT answer_text, difficulty_score
            FROM answers
            WHERE question_id = $1
            ORDER BY display_order
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let mut answers = Vec::with_capacity(answer_rows.len());
        for row in &answer_rows {
            answers.push(Answer {
                text: row
                    .try_get("answer_text")
                    .map_err(|e| ProviderError::Malformed(e.to_string()))?,
                points: row
                    .try_get("difficulty_score")
                    .map_err(|e| ProviderError::Malformed(e.to_string()))?,
            });
        }

        Ok(Some(Question { text, answers }))
    }
}
