use std::collections::BTreeMap;

use sqlx::{PgConnection, PgPool};

use crate::error::{Error, Result};
use crate::models::category::{Category, GroupCount};
use crate::models::question::{NewQuestion, Question};

const QUESTION_COLUMNS: &str = "id, category_id, question_text, choice_a, choice_b, choice_c, \
                                choice_d, correct_answer, group_number";

#[derive(Clone)]
pub struct QuestionBankService {
    pool: PgPool,
}

impl QuestionBankService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_category(&self, name: &str, description: &str) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(category_id = category.id, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, category_id: i64) -> Result<Category> {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, name, description FROM categories WHERE id = $1"#,
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Category {} not found", category_id)))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"SELECT id, name, description FROM categories ORDER BY name, id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Deleting a category removes its questions, sessions and their answers.
    pub async fn delete_category(&self, category_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_question(&self, category_id: i64, question: &NewQuestion) -> Result<Question> {
        self.get_category(category_id).await?;
        let [choice_a, choice_b, choice_c, choice_d] = &question.choices;
        let created = sqlx::query_as::<_, Question>(&format!(
            r#"
            INSERT INTO questions (
                category_id, question_text, choice_a, choice_b, choice_c, choice_d,
                correct_answer, group_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(category_id)
        .bind(&question.question_text)
        .bind(choice_a)
        .bind(choice_b)
        .bind(choice_c)
        .bind(choice_d)
        .bind(question.correct_answer.as_str())
        .bind(question.group_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Inserts a batch in one statement on the caller's connection, so the
    /// caller decides the transactional boundary.
    pub async fn bulk_create(
        conn: &mut PgConnection,
        category_id: i64,
        questions: &[NewQuestion],
    ) -> Result<u64> {
        if questions.is_empty() {
            return Ok(0);
        }

        let mut texts = Vec::with_capacity(questions.len());
        let mut choice_a = Vec::with_capacity(questions.len());
        let mut choice_b = Vec::with_capacity(questions.len());
        let mut choice_c = Vec::with_capacity(questions.len());
        let mut choice_d = Vec::with_capacity(questions.len());
        let mut answers = Vec::with_capacity(questions.len());
        let mut groups = Vec::with_capacity(questions.len());
        for q in questions {
            texts.push(q.question_text.clone());
            choice_a.push(q.choices[0].clone());
            choice_b.push(q.choices[1].clone());
            choice_c.push(q.choices[2].clone());
            choice_d.push(q.choices[3].clone());
            answers.push(q.correct_answer.as_str().to_string());
            groups.push(q.group_number);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO questions (
                category_id, question_text, choice_a, choice_b, choice_c, choice_d,
                correct_answer, group_number
            )
            SELECT $1, t.question_text, t.choice_a, t.choice_b, t.choice_c, t.choice_d,
                   t.correct_answer, t.group_number
            FROM UNNEST($2::TEXT[], $3::TEXT[], $4::TEXT[], $5::TEXT[], $6::TEXT[], $7::TEXT[], $8::INT4[])
                WITH ORDINALITY
                AS t(question_text, choice_a, choice_b, choice_c, choice_d, correct_answer, group_number, ord)
            ORDER BY t.ord
            "#,
        )
        .bind(category_id)
        .bind(&texts)
        .bind(&choice_a)
        .bind(&choice_b)
        .bind(&choice_c)
        .bind(&choice_d)
        .bind(&answers)
        .bind(&groups)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Questions of one group in insertion order.
    pub async fn questions_for(&self, category_id: i64, group_number: i32) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            r#"
            SELECT {}
            FROM questions
            WHERE category_id = $1 AND group_number = $2
            ORDER BY id
            "#,
            QUESTION_COLUMNS
        ))
        .bind(category_id)
        .bind(group_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    /// Admin listing, optionally narrowed to one group.
    pub async fn list_questions(
        &self,
        category_id: i64,
        group_number: Option<i32>,
    ) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            r#"
            SELECT {}
            FROM questions
            WHERE category_id = $1
              AND ($2::INT4 IS NULL OR group_number = $2)
            ORDER BY group_number, id
            "#,
            QUESTION_COLUMNS
        ))
        .bind(category_id)
        .bind(group_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn group_summary(&self, category_id: i64) -> Result<BTreeMap<i32, i64>> {
        let rows = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT category_id, group_number, COUNT(*) AS total
            FROM questions
            WHERE category_id = $1
            GROUP BY category_id, group_number
            ORDER BY group_number
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.group_number, r.total)).collect())
    }

    /// Group counts for every category, ordered by category then group.
    pub async fn all_group_counts(&self) -> Result<Vec<GroupCount>> {
        let rows = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT category_id, group_number, COUNT(*) AS total
            FROM questions
            GROUP BY category_id, group_number
            ORDER BY category_id, group_number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn group_exists(
        conn: &mut PgConnection,
        category_id: i64,
        group_number: i32,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM questions WHERE category_id = $1 AND group_number = $2)",
        )
        .bind(category_id)
        .bind(group_number)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    pub async fn lowest_group(conn: &mut PgConnection, category_id: i64) -> Result<Option<i32>> {
        let lowest: Option<i32> =
            sqlx::query_scalar("SELECT MIN(group_number) FROM questions WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(lowest)
    }

    /// Locks the category row for the rest of the caller's transaction and
    /// returns the highest group number in use (0 when empty). Concurrent
    /// imports into the same category queue up behind the lock, so each one
    /// sees the groups written by the previous.
    pub async fn lock_max_group(conn: &mut PgConnection, category_id: i64) -> Result<i32> {
        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
                .bind(category_id)
                .fetch_optional(&mut *conn)
                .await?;
        if locked.is_none() {
            return Err(Error::NotFound(format!("Category {} not found", category_id)));
        }

        let max_group: Option<i32> =
            sqlx::query_scalar("SELECT MAX(group_number) FROM questions WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(max_group.unwrap_or(0))
    }
}
