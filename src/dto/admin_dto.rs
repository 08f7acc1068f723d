use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::importers::{CanonicalRow, ImportError};
use crate::models::question::{Letter, NewQuestion, Question};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_correct_choice"))]
pub struct CreateQuestionPayload {
    #[validate(length(min = 1))]
    pub question_text: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub choice_a: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub choice_b: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub choice_c: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub choice_d: String,
    #[validate(custom(function = "validate_letter"))]
    pub correct_answer: String,
    #[validate(range(min = 1))]
    pub group_number: Option<i32>,
}

impl CreateQuestionPayload {
    pub fn into_new_question(self) -> Result<NewQuestion, ImportError> {
        let group_number = self.group_number.unwrap_or(1).max(1);
        CanonicalRow {
            question_text: self.question_text,
            choice_a: self.choice_a,
            choice_b: self.choice_b,
            choice_c: self.choice_c,
            choice_d: self.choice_d,
            correct_answer: self.correct_answer,
        }
        .into_question(group_number)
    }
}

fn validate_letter(value: &str) -> Result<(), ValidationError> {
    match Letter::parse(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("correct_answer_must_be_a_to_d")),
    }
}

fn validate_correct_choice(payload: &CreateQuestionPayload) -> Result<(), ValidationError> {
    let Some(letter) = Letter::parse(&payload.correct_answer) else {
        return Ok(());
    };
    let choice = match letter {
        Letter::A => &payload.choice_a,
        Letter::B => &payload.choice_b,
        Letter::C => &payload.choice_c,
        Letter::D => &payload.choice_d,
    };
    if choice.trim().is_empty() {
        return Err(ValidationError::new("correct_choice_is_empty"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionListQuery {
    pub group_number: Option<i32>,
}

/// Admin view of a question, including the answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionListResponse {
    pub category_id: i64,
    pub group_number: Option<i32>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePracticeQuestionPayload {
    #[validate(length(min = 1))]
    pub question_text: String,
    #[validate(length(min = 1))]
    pub correct_answer: String,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePracticeQuestionPayload {
    #[validate(length(min = 1))]
    pub question_text: Option<String>,
    #[validate(length(min = 1))]
    pub correct_answer: Option<String>,
    /// Absent leaves the category unchanged; `null` detaches it.
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<i64>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// Practice question as administrators see it, key included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeQuestionAdminResponse {
    pub id: i64,
    pub question_text: String,
    pub correct_answer: String,
    pub category_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<crate::models::practice_question::PracticeQuestion> for PracticeQuestionAdminResponse {
    fn from(q: crate::models::practice_question::PracticeQuestion) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            correct_answer: q.correct_answer,
            category_id: q.category_id,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}
