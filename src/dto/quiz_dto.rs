use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::category::Category;
use crate::models::test_session::TestSession;
use crate::services::scoring_service::ScoreReport;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group_number: i32,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub groups: Vec<GroupSummary>,
    pub total_questions: i64,
}

impl CategoryEntry {
    pub fn new(category: Category, groups: Vec<GroupSummary>) -> Self {
        let total_questions = groups.iter().map(|g| g.total).sum();
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            groups,
            total_questions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartSessionPayload {
    #[serde(default)]
    pub group_number: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: i64,
    pub session_key: String,
    pub category_id: i64,
    pub group_number: i32,
    pub started_at: DateTime<Utc>,
}

impl From<TestSession> for StartSessionResponse {
    fn from(session: TestSession) -> Self {
        Self {
            session_id: session.id,
            session_key: session.session_key,
            category_id: session.category_id,
            group_number: session.group_number,
            started_at: session.started_at,
        }
    }
}

/// Question id to selected letter. Blank, null or unknown values clear the
/// stored answer for that question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitAnswersPayload {
    #[serde(default)]
    pub answers: HashMap<i64, Option<String>>,
}

impl SubmitAnswersPayload {
    pub fn into_answer_map(self) -> HashMap<i64, String> {
        self.answers
            .into_iter()
            .map(|(question_id, value)| (question_id, value.unwrap_or_default()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsResponse {
    pub session: TestSession,
    pub group_number: i32,
    #[serde(flatten)]
    pub report: ScoreReport,
}
