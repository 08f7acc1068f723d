use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Stable identity of a choice. Answers are stored and scored by letter,
/// never by on-screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
}

impl Letter {
    pub const ALL: [Letter; 4] = [Letter::A, Letter::B, Letter::C, Letter::D];

    /// Accepts `a`..`d` in either case, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Letter> {
        match raw.trim().to_uppercase().as_str() {
            "A" => Some(Letter::A),
            "B" => Some(Letter::B),
            "C" => Some(Letter::C),
            "D" => Some(Letter::D),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Letter::A => "A",
            Letter::B => "B",
            Letter::C => "C",
            Letter::D => "D",
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub category_id: i64,
    pub question_text: String,
    pub choice_a: String,
    pub choice_b: String,
    pub choice_c: String,
    pub choice_d: String,
    pub correct_answer: String,
    pub group_number: i32,
}

impl Question {
    pub fn choice(&self, letter: Letter) -> &str {
        match letter {
            Letter::A => &self.choice_a,
            Letter::B => &self.choice_b,
            Letter::C => &self.choice_c,
            Letter::D => &self.choice_d,
        }
    }

    /// Choices in their stored A-D order.
    pub fn choices(&self) -> [(Letter, &str); 4] {
        Letter::ALL.map(|letter| (letter, self.choice(letter)))
    }

    pub fn correct_letter(&self) -> Option<Letter> {
        Letter::parse(&self.correct_answer)
    }
}

/// A question ready to be written into a category group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question_text: String,
    pub choices: [String; 4],
    pub correct_answer: Letter,
    pub group_number: i32,
}
