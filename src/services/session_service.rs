use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::error::{Error, Result};
use crate::models::question::{Letter, Question};
use crate::models::test_session::{TestSession, UserAnswer};
use crate::services::question_bank_service::QuestionBankService;
use crate::services::scoring_service::{ScoreReport, ScoringService};

const SESSION_COLUMNS: &str = "id, session_key, started_at, finished_at, category_id, group_number";

#[derive(Debug, Clone, Serialize)]
pub struct DisplayOption {
    pub value: Letter,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayQuestion {
    pub number: usize,
    pub question_id: i64,
    pub question_text: String,
    /// Previously saved letter, or empty.
    pub selected: String,
    pub options: Vec<DisplayOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session: TestSession,
    pub questions: Vec<DisplayQuestion>,
    pub total_questions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub session_id: i64,
    pub saved: usize,
    pub cleared: usize,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Which answers a submission writes and which it removes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AnswerChanges {
    pub upserts: Vec<(i64, Letter)>,
    pub clears: Vec<i64>,
}

#[derive(Clone)]
pub struct SessionService {
    pool: PgPool,
    question_bank: QuestionBankService,
}

impl SessionService {
    pub fn new(pool: PgPool) -> Self {
        let question_bank = QuestionBankService::new(pool.clone());
        Self { pool, question_bank }
    }

    /// Starts a session on a category group. An empty group falls back to the
    /// category's lowest non-empty group; a category without questions is
    /// `NotFound`.
    pub async fn create_session(
        &self,
        category_id: i64,
        requested_group: i32,
        session_key: &str,
    ) -> Result<TestSession> {
        self.question_bank.get_category(category_id).await?;
        let requested_group = requested_group.max(1);

        let mut tx = self.pool.begin().await?;
        let group_number = resolve_group(&mut tx, category_id, requested_group).await?;
        let session = sqlx::query_as::<_, TestSession>(&format!(
            r#"
            INSERT INTO test_sessions (session_key, category_id, group_number)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(session_key)
        .bind(category_id)
        .bind(group_number)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            session_id = session.id,
            category_id,
            requested_group,
            group_number,
            "Test session created"
        );
        Ok(session)
    }

    /// Loads a session, requiring the caller's browser key to match.
    pub async fn get_owned_session(&self, session_id: i64, session_key: &str) -> Result<TestSession> {
        let session = sqlx::query_as::<_, TestSession>(&format!(
            "SELECT {} FROM test_sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Test session {} not found", session_id)))?;

        ensure_owner(&session, session_key)?;
        Ok(session)
    }

    /// Applies one answer sheet. Every question of the session's group is
    /// visited: a valid letter is upserted, anything else clears the stored
    /// answer. The first submission marks the session finished.
    pub async fn submit_answers(
        &self,
        session_id: i64,
        session_key: &str,
        answers: &HashMap<i64, String>,
    ) -> Result<SubmitOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock serialises concurrent submissions for the same session.
        let session = sqlx::query_as::<_, TestSession>(&format!(
            "SELECT {} FROM test_sessions WHERE id = $1 FOR UPDATE",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Test session {} not found", session_id)))?;
        ensure_owner(&session, session_key)?;

        let question_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM questions
            WHERE category_id = $1 AND group_number = $2
            ORDER BY id
            "#,
        )
        .bind(session.category_id)
        .bind(session.group_number)
        .fetch_all(&mut *tx)
        .await?;

        let changes = plan_answer_changes(&question_ids, answers);
        upsert_answers(&mut tx, session.id, &changes.upserts).await?;
        clear_answers(&mut tx, session.id, &changes.clears).await?;

        // A group emptied after the session started has nothing to finish.
        let finished_at = if question_ids.is_empty() {
            session.finished_at
        } else {
            let finished_at: DateTime<Utc> = sqlx::query_scalar(
                r#"
                UPDATE test_sessions
                SET finished_at = COALESCE(finished_at, NOW())
                WHERE id = $1
                RETURNING finished_at
                "#,
            )
            .bind(session.id)
            .fetch_one(&mut *tx)
            .await?;
            Some(finished_at)
        };
        tx.commit().await?;

        tracing::info!(
            session_id,
            saved = changes.upserts.len(),
            cleared = changes.clears.len(),
            first_submission = !session.is_finished() && finished_at.is_some(),
            "Answers submitted"
        );
        Ok(SubmitOutcome {
            session_id,
            saved: changes.upserts.len(),
            cleared: changes.clears.len(),
            finished_at,
        })
    }

    /// Questions of the session's group with saved answers and a fresh,
    /// unpersisted choice order.
    pub async fn load_for_display(&self, session_id: i64, session_key: &str) -> Result<SessionView> {
        let session = self.get_owned_session(session_id, session_key).await?;
        let questions = self
            .question_bank
            .questions_for(session.category_id, session.group_number)
            .await?;
        let saved = self.answers_for(session.id).await?;

        let mut rng = rand::thread_rng();
        let questions: Vec<DisplayQuestion> = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| DisplayQuestion {
                number: idx + 1,
                question_id: q.id,
                question_text: q.question_text.clone(),
                selected: saved.get(&q.id).cloned().unwrap_or_default(),
                options: shuffled_options(q, &mut rng),
            })
            .collect();

        Ok(SessionView {
            total_questions: questions.len(),
            session,
            questions,
        })
    }

    pub async fn results(&self, session_id: i64, session_key: &str) -> Result<(TestSession, ScoreReport)> {
        let session = self.get_owned_session(session_id, session_key).await?;
        let questions = self
            .question_bank
            .questions_for(session.category_id, session.group_number)
            .await?;
        let answers = self.answers_for(session.id).await?;
        let report = ScoringService::score(&questions, &answers);
        Ok((session, report))
    }

    /// Stored answers keyed by question id.
    pub async fn answers_for(&self, session_id: i64) -> Result<HashMap<i64, String>> {
        let rows = sqlx::query_as::<_, UserAnswer>(
            r#"
            SELECT id, test_session_id, question_id, selected_answer
            FROM user_answers
            WHERE test_session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|answer| (answer.question_id, answer.selected_answer))
            .collect())
    }
}

fn ensure_owner(session: &TestSession, session_key: &str) -> Result<()> {
    if session.is_owned_by(session_key) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "session key does not own test session {}",
            session.id
        )))
    }
}

async fn resolve_group(conn: &mut PgConnection, category_id: i64, requested: i32) -> Result<i32> {
    if QuestionBankService::group_exists(conn, category_id, requested).await? {
        return Ok(requested);
    }
    QuestionBankService::lowest_group(conn, category_id)
        .await?
        .ok_or_else(|| Error::NotFound("No questions are available for this category".to_string()))
}

async fn upsert_answers(conn: &mut PgConnection, session_id: i64, upserts: &[(i64, Letter)]) -> Result<()> {
    if upserts.is_empty() {
        return Ok(());
    }
    let (question_ids, letters): (Vec<i64>, Vec<String>) = upserts
        .iter()
        .map(|(id, letter)| (*id, letter.as_str().to_string()))
        .unzip();

    sqlx::query(
        r#"
        INSERT INTO user_answers (test_session_id, question_id, selected_answer)
        SELECT $1, t.question_id, t.selected_answer
        FROM UNNEST($2::INT8[], $3::TEXT[]) AS t(question_id, selected_answer)
        ON CONFLICT (test_session_id, question_id)
        DO UPDATE SET selected_answer = EXCLUDED.selected_answer
        "#,
    )
    .bind(session_id)
    .bind(&question_ids)
    .bind(&letters)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn clear_answers(conn: &mut PgConnection, session_id: i64, question_ids: &[i64]) -> Result<()> {
    if question_ids.is_empty() {
        return Ok(());
    }
    sqlx::query("DELETE FROM user_answers WHERE test_session_id = $1 AND question_id = ANY($2)")
        .bind(session_id)
        .bind(question_ids)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Splits a submission over the group's questions. Submitted values for
/// questions outside the group are ignored.
pub fn plan_answer_changes(question_ids: &[i64], submitted: &HashMap<i64, String>) -> AnswerChanges {
    let mut changes = AnswerChanges::default();
    for &question_id in question_ids {
        match submitted.get(&question_id).and_then(|raw| Letter::parse(raw)) {
            Some(letter) => changes.upserts.push((question_id, letter)),
            None => changes.clears.push(question_id),
        }
    }
    changes
}

/// Non-empty choices in a random order. Values stay bound to their letter.
pub fn shuffled_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Vec<DisplayOption> {
    let mut options: Vec<DisplayOption> = question
        .choices()
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(value, text)| DisplayOption {
            value,
            text: text.to_string(),
        })
        .collect();
    options.shuffle(rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn question(choice_d: &str) -> Question {
        Question {
            id: 10,
            category_id: 1,
            question_text: "Pick".into(),
            choice_a: "alpha".into(),
            choice_b: "beta".into(),
            choice_c: "gamma".into(),
            choice_d: choice_d.into(),
            correct_answer: "B".into(),
            group_number: 1,
        }
    }

    #[test]
    fn valid_letters_upsert_and_everything_else_clears() {
        let submitted = HashMap::from([
            (1, "a".to_string()),
            (2, "".to_string()),
            (3, "x".to_string()),
            (99, "B".to_string()),
        ]);
        let changes = plan_answer_changes(&[1, 2, 3, 4], &submitted);
        assert_eq!(changes.upserts, vec![(1, Letter::A)]);
        assert_eq!(changes.clears, vec![2, 3, 4]);
    }

    #[test]
    fn empty_submission_clears_every_question() {
        let changes = plan_answer_changes(&[5, 6], &HashMap::new());
        assert!(changes.upserts.is_empty());
        assert_eq!(changes.clears, vec![5, 6]);
    }

    #[test]
    fn shuffled_options_keep_letter_to_text_binding() {
        let q = question("delta");
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let options = shuffled_options(&q, &mut rng);
            assert_eq!(options.len(), 4);
            for option in &options {
                assert_eq!(option.text, q.choice(option.value));
            }
            let letters: HashSet<Letter> = options.iter().map(|o| o.value).collect();
            assert_eq!(letters.len(), 4);
        }
    }

    #[test]
    fn empty_choices_are_not_displayed() {
        let q = question("");
        let mut rng = StdRng::seed_from_u64(1);
        let options = shuffled_options(&q, &mut rng);
        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|o| o.value != Letter::D));
    }

    #[test]
    fn shuffle_produces_more_than_one_order() {
        let q = question("delta");
        let mut rng = StdRng::seed_from_u64(42);
        let orders: HashSet<Vec<Letter>> = (0..50)
            .map(|_| shuffled_options(&q, &mut rng).iter().map(|o| o.value).collect())
            .collect();
        assert!(orders.len() > 1);
    }
}
