//! Local file analysis: preview a tabular file with an LLM-inferred
//! schema, or hand it to the AI-assisted upload endpoint where the
//! service itself infers the schema and loads the shared analysis
//! database.

use anyhow::{Context, Result};
use std::path::Path;

use tablechat_sdk::{log_workflow_complete, log_workflow_start, ProgressStep, PROCESS_INTERRUPTED};

use crate::services::Services;
use crate::tabular;
use crate::types::{DbCredentials, InferredSchema, TableInfo};
use crate::workflows::{Progress, WorkflowContext};

/// Rows included in the schema-inference sample (header included)
const SAMPLE_LIMIT: usize = 5;

/// A local file sample with its inferred schema, for grid rendering
#[derive(Debug, Clone)]
pub struct FilePreview {
    pub delimiter: char,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub schema: InferredSchema,
}

/// Read a local file, detect its delimiter and infer a column schema from
/// the first rows. Nothing is uploaded.
pub async fn preview(services: &Services, file: &Path) -> Result<FilePreview> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read file {}", file.display()))?;

    let delimiter = tabular::detect_delimiter(&content);
    let sample = tabular::sample_rows(&content, SAMPLE_LIMIT)?;
    let schema = services
        .completion
        .infer_schema(&sample, delimiter)
        .await
        .context("Failed to infer a schema for the file")?;
    let (headers, rows) = tabular::parse_delimited(&content, delimiter, SAMPLE_LIMIT)?;

    Ok(FilePreview {
        delimiter,
        headers,
        rows,
        schema,
    })
}

/// Declared step list for the AI-assisted upload
pub fn steps() -> Vec<ProgressStep> {
    vec![
        ProgressStep::pending("1", "Uploading file for AI-assisted load..."),
        ProgressStep::pending("2", "Configuring shared database credentials..."),
        ProgressStep::pending("3", "Finalizing upload..."),
    ]
}

/// Upload without explicit credentials; the ingestion service infers the
/// schema and loads the shared analysis database. On success the shared
/// credentials (when configured) replace the stored slot so follow-up
/// pushes land in the same place.
pub async fn upload_llm_assisted(
    services: &Services,
    ctx: &WorkflowContext,
    file: &Path,
    shared_credentials: Option<&DbCredentials>,
    progress: Progress<'_>,
) -> Result<TableInfo> {
    log_workflow_start!("AI-Assisted Upload", "Load a file into the shared analysis database");

    progress.start("1");
    let outcome = match services.ingestor.upload_llm_assisted(file).await {
        Ok(outcome) => outcome,
        Err(err) => {
            progress.fail_remaining(PROCESS_INTERRUPTED);
            return Err(err).context("Failed to upload file");
        }
    };

    progress.advance("1", "2");
    if let Some(credentials) = shared_credentials {
        ctx.credentials.set(credentials.clone());
    }

    progress.advance("2", "3");
    progress.complete_with_message(
        "3",
        format!(
            "{} rows inserted into table {}",
            outcome.rows_inserted, outcome.table_name
        ),
    );

    log_workflow_complete!("AI-Assisted Upload");
    Ok(TableInfo {
        table_name: outcome.table_name,
        row_count: outcome.rows_inserted,
        columns: outcome.columns,
    })
}
