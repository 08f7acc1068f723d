use serde_json::{Map, Value as JsonValue};

use super::{CanonicalRow, ImportError, ImportFormat, RowParser};

/// Accepts either a bare list of question objects or `{"questions": [...]}`.
pub struct JsonParser;

impl RowParser for JsonParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Json
    }

    fn parse(&self, data: &[u8]) -> Result<Vec<CanonicalRow>, ImportError> {
        let document: JsonValue = serde_json::from_slice(data).map_err(ImportError::parse)?;
        let items = match document {
            JsonValue::Array(items) => items,
            JsonValue::Object(mut map) => match map.remove("questions") {
                Some(JsonValue::Array(items)) => items,
                None | Some(JsonValue::Null) => Vec::new(),
                Some(_) => {
                    return Err(ImportError::parse("\"questions\" must be a list"));
                }
            },
            _ => {
                return Err(ImportError::parse(
                    "expected a list of questions or an object with a \"questions\" list",
                ))
            }
        };

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let JsonValue::Object(fields) = item else {
                return Err(ImportError::parse("every question must be a JSON object"));
            };
            let Some(question_text) = optional_text(&fields, "question_text") else {
                continue;
            };
            rows.push(CanonicalRow {
                question_text,
                choice_a: required_text(&fields, "choice_a")?,
                choice_b: required_text(&fields, "choice_b")?,
                choice_c: required_text(&fields, "choice_c")?,
                choice_d: required_text(&fields, "choice_d")?,
                correct_answer: required_string(&fields, "correct_answer")?.to_uppercase(),
            });
        }
        Ok(rows)
    }
}

/// Null, empty and missing values all mean "no question"; scalars are stringified.
fn optional_text(fields: &Map<String, JsonValue>, key: &str) -> Option<String> {
    match fields.get(key)? {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn required_text(fields: &Map<String, JsonValue>, key: &str) -> Result<String, ImportError> {
    match fields.get(key) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Null) => Ok(String::new()),
        Some(other) => Ok(other.to_string()),
        None => Err(ImportError::Parse(format!("missing field `{}`", key))),
    }
}

fn required_string(fields: &Map<String, JsonValue>, key: &str) -> Result<String, ImportError> {
    match fields.get(key) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(ImportError::Parse(format!("field `{}` must be a string", key))),
        None => Err(ImportError::Parse(format!("missing field `{}`", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(text: &str, answer: &str) -> JsonValue {
        json!({
            "question_text": text,
            "choice_a": "one",
            "choice_b": "two",
            "choice_c": "three",
            "choice_d": "four",
            "correct_answer": answer,
        })
    }

    #[test]
    fn bare_list_is_accepted() {
        let data = json!([item("Q1", "a"), item("Q2", "D")]).to_string();
        let rows = JsonParser.parse(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].correct_answer, "A");
        assert_eq!(rows[1].choice_d, "four");
    }

    #[test]
    fn wrapped_list_is_accepted() {
        let data = json!({ "questions": [item("Q1", "b")] }).to_string();
        let rows = JsonParser.parse(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].correct_answer, "B");
    }

    #[test]
    fn object_without_questions_key_yields_nothing() {
        let rows = JsonParser.parse(br#"{"title": "bank"}"#).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn items_without_question_text_are_skipped() {
        let mut missing = item("x", "A");
        missing.as_object_mut().unwrap().remove("question_text");
        let data = json!([item("", "A"), missing, item("Kept", "C")]).to_string();
        let rows = JsonParser.parse(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question_text, "Kept");
    }

    #[test]
    fn missing_choice_is_a_parse_error() {
        let mut broken = item("Q", "A");
        broken.as_object_mut().unwrap().remove("choice_c");
        let data = json!([broken]).to_string();
        assert!(matches!(JsonParser.parse(data.as_bytes()), Err(ImportError::Parse(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(JsonParser.parse(b"[{"), Err(ImportError::Parse(_))));
        assert!(matches!(JsonParser.parse(b"\"just a string\""), Err(ImportError::Parse(_))));
    }
}
