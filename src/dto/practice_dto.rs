use serde::{Deserialize, Serialize};

use crate::models::practice_question::PracticeQuestion;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeListQuery {
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeListResponse {
    pub questions: Vec<PracticeQuestion>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeCheckPayload {
    #[serde(default)]
    pub user_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeCheckResponse {
    pub question: PracticeQuestion,
    pub user_answer: String,
    pub is_correct: bool,
    pub correct_answer: String,
}
