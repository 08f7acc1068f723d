use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use std::io::Cursor;

use super::{CanonicalRow, ImportError, ImportFormat, RowParser};

/// First worksheet, header row discarded. Columns: question, correct answer,
/// then up to three wrong answers. The correct answer always lands in slot A.
pub struct XlsxParser;

impl RowParser for XlsxParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::Xlsx
    }

    fn parse(&self, data: &[u8]) -> Result<Vec<CanonicalRow>, ImportError> {
        let mut workbook: Xlsx<_> =
            open_workbook_from_rs(Cursor::new(data)).map_err(ImportError::parse)?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(ImportError::parse)?,
            None => return Ok(Vec::new()),
        };
        Ok(rows_from_range(&range))
    }
}

fn rows_from_range(range: &Range<Data>) -> Vec<CanonicalRow> {
    // A range only spans used cells; re-anchor it so row 0 is always the header.
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let first_col = first_col as usize;

    range
        .rows()
        .enumerate()
        .filter(|(offset, _)| first_row as usize + offset > 0)
        .filter_map(|(_, cells)| {
            let cell = |col: usize| -> String {
                col.checked_sub(first_col)
                    .and_then(|idx| cells.get(idx))
                    .map(cell_to_string)
                    .unwrap_or_default()
            };
            row_from_cells([cell(0), cell(1), cell(2), cell(3), cell(4)])
        })
        .collect()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// `[question, correct, wrong1, wrong2, wrong3]` -> canonical row, or `None`
/// when the question or correct answer is blank or no wrong answer is given.
pub fn row_from_cells(cells: [String; 5]) -> Option<CanonicalRow> {
    let [question_text, correct, wrong1, wrong2, wrong3] = cells;
    if question_text.is_empty() || correct.is_empty() {
        return None;
    }

    let mut answers = [correct, wrong1, wrong2, wrong3]
        .into_iter()
        .filter(|value| !value.is_empty());
    let choice_a = answers.next()?;
    let mut others: Vec<String> = answers.collect();
    if others.is_empty() {
        return None;
    }
    others.resize(3, String::new());
    let [choice_b, choice_c, choice_d]: [String; 3] = others.try_into().ok()?;

    Some(CanonicalRow {
        question_text,
        choice_a,
        choice_b,
        choice_c,
        choice_d,
        correct_answer: "A".to_string(),
    })
}
