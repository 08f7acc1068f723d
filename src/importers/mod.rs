//! Bulk question import.
//!
//! Every supported upload format is reduced to a sequence of [`CanonicalRow`]s
//! by a [`RowParser`]. The rows are then validated and assigned to fixed-size
//! groups by [`chunking::GroupPlanner`] before the import service writes them.

pub mod chunking;
pub mod csv_parser;
#[cfg(feature = "docx")]
pub mod docx_parser;
pub mod json_parser;
#[cfg(feature = "xlsx")]
pub mod xlsx_parser;

use crate::models::question::{Letter, NewQuestion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest choice text the question bank stores.
pub const MAX_CHOICE_CHARS: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Unsupported file format '{0}': only CSV, JSON, DOCX or Excel (XLSX) files can be uploaded")]
    UnsupportedFormat(String),

    #[error("{0} import is not available in this build")]
    ParserUnavailable(ImportFormat),

    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("Error reading file: {0}")]
    Parse(String),

    #[error("Invalid question: {0}")]
    InvalidRow(String),
}

impl ImportError {
    pub fn parse(err: impl fmt::Display) -> Self {
        ImportError::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Json,
    Docx,
    Xlsx,
}

impl ImportFormat {
    /// Detects the format from the uploaded file name's extension.
    pub fn from_filename(filename: &str) -> Result<Self, ImportError> {
        let name = filename.trim().to_lowercase();
        let format = if name.ends_with(".csv") {
            ImportFormat::Csv
        } else if name.ends_with(".json") {
            ImportFormat::Json
        } else if name.ends_with(".docx") {
            ImportFormat::Docx
        } else if name.ends_with(".xlsx") {
            ImportFormat::Xlsx
        } else {
            let ext = std::path::Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string();
            return Err(ImportError::UnsupportedFormat(ext));
        };
        Ok(format)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImportFormat::Csv => "CSV",
            ImportFormat::Json => "JSON",
            ImportFormat::Docx => "DOCX (Word)",
            ImportFormat::Xlsx => "Excel (XLSX)",
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The normalized shape every import format is converted into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub question_text: String,
    pub choice_a: String,
    pub choice_b: String,
    pub choice_c: String,
    pub choice_d: String,
    pub correct_answer: String,
}

impl CanonicalRow {
    /// Checks the answer key and turns the row into an insertable question.
    pub fn into_question(self, group_number: i32) -> Result<NewQuestion, ImportError> {
        let letter = Letter::parse(&self.correct_answer).ok_or_else(|| {
            ImportError::InvalidRow(format!(
                "correct answer '{}' for \"{}\" must be one of A, B, C, D",
                self.correct_answer,
                preview(&self.question_text)
            ))
        })?;
        let choices = [self.choice_a, self.choice_b, self.choice_c, self.choice_d];
        for (choice, label) in choices.iter().zip(["A", "B", "C", "D"]) {
            let chars = choice.chars().count();
            if chars > MAX_CHOICE_CHARS {
                return Err(ImportError::InvalidRow(format!(
                    "choice {} of \"{}\" is {} characters long, the limit is {}",
                    label,
                    preview(&self.question_text),
                    chars,
                    MAX_CHOICE_CHARS
                )));
            }
        }
        if choices[letter_index(letter)].trim().is_empty() {
            return Err(ImportError::InvalidRow(format!(
                "choice {} of \"{}\" is the correct answer but is empty",
                letter,
                preview(&self.question_text)
            )));
        }
        Ok(NewQuestion {
            question_text: self.question_text,
            choices,
            correct_answer: letter,
            group_number,
        })
    }
}

fn letter_index(letter: Letter) -> usize {
    match letter {
        Letter::A => 0,
        Letter::B => 1,
        Letter::C => 2,
        Letter::D => 3,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

/// Turns the raw bytes of one uploaded file into canonical rows.
pub trait RowParser: Send + Sync {
    fn format(&self) -> ImportFormat;

    fn parse(&self, data: &[u8]) -> Result<Vec<CanonicalRow>, ImportError>;
}

/// Resolves the parser for a format. Optional formats compiled out of this
/// build are reported here, per request, rather than at startup.
pub fn parser_for(format: ImportFormat) -> Result<Box<dyn RowParser>, ImportError> {
    match format {
        ImportFormat::Csv => Ok(Box::new(csv_parser::CsvParser)),
        ImportFormat::Json => Ok(Box::new(json_parser::JsonParser)),
        ImportFormat::Docx => load_docx_parser(),
        ImportFormat::Xlsx => load_xlsx_parser(),
    }
}

#[cfg(feature = "docx")]
fn load_docx_parser() -> Result<Box<dyn RowParser>, ImportError> {
    Ok(Box::new(docx_parser::DocxParser))
}

#[cfg(not(feature = "docx"))]
fn load_docx_parser() -> Result<Box<dyn RowParser>, ImportError> {
    Err(ImportError::ParserUnavailable(ImportFormat::Docx))
}

#[cfg(feature = "xlsx")]
fn load_xlsx_parser() -> Result<Box<dyn RowParser>, ImportError> {
    Ok(Box::new(xlsx_parser::XlsxParser))
}

#[cfg(not(feature = "xlsx"))]
fn load_xlsx_parser() -> Result<Box<dyn RowParser>, ImportError> {
    Err(ImportError::ParserUnavailable(ImportFormat::Xlsx))
}
