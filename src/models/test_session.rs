use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestSession {
    pub id: i64,
    #[serde(skip_serializing)]
    pub session_key: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub category_id: i64,
    pub group_number: i32,
}

impl TestSession {
    pub fn is_owned_by(&self, session_key: &str) -> bool {
        !session_key.is_empty() && self.session_key == session_key
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAnswer {
    pub id: i64,
    pub test_session_id: i64,
    pub question_id: i64,
    pub selected_answer: String,
}
