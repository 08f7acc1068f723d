use serde::Deserialize;

use super::{CanonicalRow, ImportError, ImportFormat, RowParser};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header-driven CSV: `question_text, choice_a, choice_b, choice_c, choice_d, correct_answer`.
pub struct CsvParser;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(default)]
    question_text: Option<String>,
    choice_a: String,
    choice_b: String,
    choice_c: String,
    choice_d: String,
    correct_answer: String,
}

impl RowParser for CsvParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Csv
    }

    fn parse(&self, data: &[u8]) -> Result<Vec<CanonicalRow>, ImportError> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data);

        let mut rows = Vec::new();
        for record in reader.deserialize::<CsvRecord>() {
            let record = record.map_err(ImportError::parse)?;
            let question_text = match record.question_text {
                Some(text) if !text.is_empty() => text,
                _ => continue,
            };
            rows.push(CanonicalRow {
                question_text,
                choice_a: record.choice_a,
                choice_b: record.choice_b,
                choice_c: record.choice_c,
                choice_d: record.choice_d,
                correct_answer: record.correct_answer.to_uppercase(),
            });
        }
        Ok(rows)
    }
}
