use bytes::Bytes;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::importers::{self, chunking, CanonicalRow, ImportError, ImportFormat};
use crate::services::question_bank_service::QuestionBankService;

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub category_id: i64,
    pub format: ImportFormat,
    pub created: u64,
    pub groups: Vec<i32>,
    pub message: String,
}

#[derive(Clone)]
pub struct ImportService {
    pool: PgPool,
}

impl ImportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parses one uploaded file and appends its questions to the category in
    /// groups of `chunk_size`. The whole upload is one transaction: a failure
    /// anywhere leaves the question bank untouched.
    pub async fn import(
        &self,
        category_id: i64,
        filename: &str,
        data: Bytes,
        chunk_size: usize,
    ) -> Result<ImportReport> {
        if chunk_size == 0 {
            return Err(ImportError::InvalidChunkSize.into());
        }
        let format = ImportFormat::from_filename(filename)?;
        let parser = importers::parser_for(format)?;
        tracing::debug!(category_id, parser = %parser.format(), "Import parser selected");

        let rows: Vec<CanonicalRow> = tokio::task::spawn_blocking(move || parser.parse(&data))
            .await
            .map_err(|e| Error::Internal(format!("Import parser task failed: {}", e)))??;
        tracing::info!(category_id, format = %format, rows = rows.len(), "Parsed import file");

        let mut tx = self.pool.begin().await?;
        let existing_max = QuestionBankService::lock_max_group(&mut tx, category_id).await?;
        let chunks = chunking::plan_chunks(rows, existing_max, chunk_size)?;

        let mut created = 0u64;
        let mut groups = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            created +=
                QuestionBankService::bulk_create(&mut tx, category_id, &chunk.questions).await?;
            groups.push(chunk.group_number);
        }
        tx.commit().await?;

        tracing::info!(category_id, created, groups = ?groups, "Questions imported");
        Ok(ImportReport {
            category_id,
            format,
            created,
            message: format!(
                "{} questions were added from the {} file.",
                created,
                format.label()
            ),
            groups,
        })
    }
}
