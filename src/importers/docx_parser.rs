use quick_xml::events::Event;
use std::io::{Cursor, Read};

use super::{CanonicalRow, ImportError, ImportFormat, RowParser};

const RECORD_LINES: usize = 6;
const ANSWER_PREFIXES: [&str; 2] = ["javob", "answer"];

/// Word documents laid out as repeating six-paragraph records:
///
/// ```text
/// Question text
/// A) choice
/// B) choice
/// C) choice
/// D) choice
/// Javob: C
/// ```
pub struct DocxParser;

impl RowParser for DocxParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Docx
    }

    fn parse(&self, data: &[u8]) -> Result<Vec<CanonicalRow>, ImportError> {
        let xml = read_document_xml(data)?;
        let lines: Vec<String> = body_paragraphs(&xml)?
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Ok(parse_lines(&lines))
    }
}

fn read_document_xml(data: &[u8]) -> Result<String, ImportError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(ImportError::parse)?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ImportError::Parse(format!("not a Word document: {}", e)))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(ImportError::parse)?;
    Ok(xml)
}

/// Text of each top-level body paragraph, in document order. Table cells and
/// paragraphs nested inside other paragraphs (text boxes) are not part of the
/// flat paragraph sequence.
fn body_paragraphs(xml: &str) -> Result<Vec<String>, ImportError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut paragraph_depth = 0usize;
    let mut table_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(ImportError::parse)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        current.clear();
                    }
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if paragraph_depth == 1 && table_depth == 0 {
                    match e.name().as_ref() {
                        b"w:tab" => current.push('\t'),
                        b"w:br" | b"w:cr" => current.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(t) => {
                if in_text && paragraph_depth == 1 && table_depth == 0 {
                    current.push_str(&t.unescape().map_err(ImportError::parse)?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:p" => {
                    if paragraph_depth == 1 && table_depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

/// Scans six-line windows. A window whose last line is not a usable answer
/// line is dropped and the scan resumes one line later.
pub fn parse_lines(lines: &[String]) -> Vec<CanonicalRow> {
    let mut rows = Vec::new();
    let mut i = 0;
    while i + RECORD_LINES <= lines.len() {
        let window = &lines[i..i + RECORD_LINES];
        match answer_letter(&window[5]) {
            Some(correct_answer) => {
                rows.push(CanonicalRow {
                    question_text: window[0].clone(),
                    choice_a: clean_choice(&window[1]),
                    choice_b: clean_choice(&window[2]),
                    choice_c: clean_choice(&window[3]),
                    choice_d: clean_choice(&window[4]),
                    correct_answer,
                });
                i += RECORD_LINES;
            }
            None => i += 1,
        }
    }
    rows
}

/// Strips a leading `X)` or `X.` marker.
fn clean_choice(line: &str) -> String {
    let mut chars = line.chars();
    let marker = chars.next();
    let separator = chars.next();
    let rest = chars.as_str();
    match (marker, separator) {
        (Some(_), Some(')' | '.')) if !rest.is_empty() => rest.trim_start().to_string(),
        _ => line.to_string(),
    }
}

/// `Javob: C`, `Javob C`, `Answer: c` -> `C`.
fn answer_letter(line: &str) -> Option<String> {
    let lowered = line.to_lowercase();
    let prefix = ANSWER_PREFIXES.iter().find(|p| lowered.starts_with(*p))?;

    let candidate = match line.split_once(':') {
        Some((_, after)) => after.trim().to_string(),
        None => line.chars().skip(prefix.len()).collect::<String>().trim().to_string(),
    };

    let letter: String = candidate.to_uppercase().chars().take(1).collect();
    matches!(letter.as_str(), "A" | "B" | "C" | "D").then_some(letter)
}
