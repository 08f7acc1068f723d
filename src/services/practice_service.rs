use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::practice_question::PracticeQuestion;

const PRACTICE_COLUMNS: &str =
    "id, question_text, correct_answer, category_id, created_at, updated_at";

#[derive(Clone)]
pub struct PracticeService {
    pool: PgPool,
}

impl PracticeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first, optionally narrowed to one category.
    pub async fn list(&self, category_id: Option<i64>) -> Result<Vec<PracticeQuestion>> {
        let questions = sqlx::query_as::<_, PracticeQuestion>(&format!(
            r#"
            SELECT {}
            FROM practice_questions
            WHERE ($1::INT8 IS NULL OR category_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
            PRACTICE_COLUMNS
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn get(&self, id: i64) -> Result<PracticeQuestion> {
        sqlx::query_as::<_, PracticeQuestion>(&format!(
            "SELECT {} FROM practice_questions WHERE id = $1",
            PRACTICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Practice question {} not found", id)))
    }

    pub async fn create(
        &self,
        question_text: &str,
        correct_answer: &str,
        category_id: Option<i64>,
    ) -> Result<PracticeQuestion> {
        let created = sqlx::query_as::<_, PracticeQuestion>(&format!(
            r#"
            INSERT INTO practice_questions (question_text, correct_answer, category_id)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            PRACTICE_COLUMNS
        ))
        .bind(question_text)
        .bind(correct_answer)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(practice_question_id = created.id, "Practice question created");
        Ok(created)
    }

    /// Partial update. `category_id: Some(None)` detaches the question from its
    /// category.
    pub async fn update(
        &self,
        id: i64,
        question_text: Option<&str>,
        correct_answer: Option<&str>,
        category_id: Option<Option<i64>>,
    ) -> Result<PracticeQuestion> {
        sqlx::query_as::<_, PracticeQuestion>(&format!(
            r#"
            UPDATE practice_questions
            SET question_text = COALESCE($2, question_text),
                correct_answer = COALESCE($3, correct_answer),
                category_id = CASE WHEN $4 THEN $5 ELSE category_id END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRACTICE_COLUMNS
        ))
        .bind(id)
        .bind(question_text)
        .bind(correct_answer)
        .bind(category_id.is_some())
        .bind(category_id.flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Practice question {} not found", id)))
    }

    /// Loads the question and compares the submitted text against its key.
    /// Nothing about the attempt is stored.
    pub async fn check(&self, id: i64, submitted: &str) -> Result<(PracticeQuestion, bool)> {
        let question = self.get(id).await?;
        let is_correct = check_answer(&question.correct_answer, submitted);
        tracing::debug!(practice_question_id = id, is_correct, "Practice answer checked");
        Ok((question, is_correct))
    }
}

/// Case-insensitive comparison ignoring surrounding whitespace. A blank
/// submission is always wrong.
pub fn check_answer(correct_answer: &str, submitted: &str) -> bool {
    let submitted = submitted.trim();
    if submitted.is_empty() {
        return false;
    }
    submitted.to_lowercase() == correct_answer.trim().to_lowercase()
}
