use crate::models::question::NewQuestion;

use super::{CanonicalRow, ImportError};

/// Numbers rows into consecutive groups of `chunk_size`, continuing after the
/// highest group already present in the category.
#[derive(Debug, Clone)]
pub struct GroupPlanner {
    chunk_size: usize,
    current_group: i32,
    in_current_group: usize,
}

impl GroupPlanner {
    pub fn new(existing_max_group: i32, chunk_size: usize) -> Result<Self, ImportError> {
        if chunk_size == 0 {
            return Err(ImportError::InvalidChunkSize);
        }
        Ok(Self {
            chunk_size,
            current_group: existing_max_group.max(0),
            in_current_group: 0,
        })
    }

    /// Group number for the next row in sequence.
    pub fn next_group(&mut self) -> i32 {
        if self.in_current_group == 0 {
            self.current_group += 1;
        }
        self.in_current_group += 1;
        if self.in_current_group == self.chunk_size {
            self.in_current_group = 0;
        }
        self.current_group
    }
}

/// One group's worth of validated questions, in row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChunk {
    pub group_number: i32,
    pub questions: Vec<NewQuestion>,
}

/// Validates every row and splits the sequence into chunks. Any invalid row
/// fails the whole plan.
pub fn plan_chunks(
    rows: Vec<CanonicalRow>,
    existing_max_group: i32,
    chunk_size: usize,
) -> Result<Vec<PlannedChunk>, ImportError> {
    let mut planner = GroupPlanner::new(existing_max_group, chunk_size)?;
    let mut chunks: Vec<PlannedChunk> = Vec::new();

    for row in rows {
        let group_number = planner.next_group();
        let question = row.into_question(group_number)?;
        match chunks.last_mut() {
            Some(chunk) if chunk.group_number == group_number => chunk.questions.push(question),
            _ => chunks.push(PlannedChunk {
                group_number,
                questions: vec![question],
            }),
        }
    }
    Ok(chunks)
}
