use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::question::Question;

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question: Question,
    /// Stored letter, or empty when the question was left unanswered.
    pub user_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
    pub percentage: f64,
    pub details: Vec<QuestionResult>,
}

pub struct ScoringService;

impl ScoringService {
    /// Scores stored answers (question id -> letter) against a group's
    /// questions. Unanswered questions count as wrong. Never fails: an empty
    /// group scores 0%.
    pub fn score(questions: &[Question], answers: &HashMap<i64, String>) -> ScoreReport {
        let mut correct = 0usize;
        let mut details = Vec::with_capacity(questions.len());

        for q in questions {
            let user_answer = answers.get(&q.id).cloned().unwrap_or_default();
            let is_correct = q
                .correct_letter()
                .is_some_and(|letter| letter.as_str() == user_answer);
            if is_correct {
                correct += 1;
            }
            details.push(QuestionResult {
                question: q.clone(),
                user_answer,
                is_correct,
            });
        }

        let total = questions.len();
        ScoreReport {
            total,
            correct,
            wrong: total - correct,
            percentage: percentage(correct, total),
            details,
        }
    }
}

/// `correct / total * 100`, rounded to two decimals; 0 for an empty group.
pub fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = Decimal::from(correct as u64) * Decimal::from(100u64) / Decimal::from(total as u64);
    ratio.round_dp(2).to_f64().unwrap_or(0.0)
}
