//! Temporary Database: provision a throwaway database, connect the agents
//! to it, then push the waiting file in the same run.
//!
//! This is the recovery path offered when a push finds no connected
//! database. The remote service owns the lifecycle of temporary databases;
//! nothing here deletes them.

use anyhow::{Context, Result};
use std::path::Path;

use tablechat_sdk::{log_workflow_complete, log_workflow_start, ProgressStep, PROCESS_INTERRUPTED};

use crate::prompts;
use crate::services::agents::dispatch_to_both;
use crate::services::provision::{generate_database_name, generate_temporary_nickname};
use crate::services::Services;
use crate::types::TableInfo;
use crate::workflows::{
    activate_chat, deliver_replies, share_schema_with_agents, Progress, WorkflowContext,
};

/// Extra context appended to the connection-test instruction
const TEMPORARY_CONTEXT: &str = "This is a temporary database created for quick analysis.";

/// Declared step list, used to initialize a managed progress display
pub fn steps() -> Vec<ProgressStep> {
    vec![
        ProgressStep::pending("1", "Creating temporary database..."),
        ProgressStep::pending("2", "Configuring database credentials..."),
        ProgressStep::pending("3", "Sending credentials to AI agents..."),
        ProgressStep::pending("4", "Uploading file to database..."),
        ProgressStep::pending("5", "Analyzing table schema..."),
        ProgressStep::pending("6", "Finalizing upload..."),
    ]
}

pub async fn run(
    services: &Services,
    ctx: &WorkflowContext,
    file: &Path,
    progress: Progress<'_>,
) -> Result<TableInfo> {
    log_workflow_start!(
        "Temporary Database",
        "Provision a throwaway database and load the file"
    );

    let result = execute(services, ctx, file, progress).await;
    if result.is_err() {
        progress.fail_remaining(PROCESS_INTERRUPTED);
    } else {
        log_workflow_complete!("Temporary Database");
    }
    result
}

async fn execute(
    services: &Services,
    ctx: &WorkflowContext,
    file: &Path,
    progress: Progress<'_>,
) -> Result<TableInfo> {
    progress.start("1");
    let nickname = generate_temporary_nickname();
    let database_name = generate_database_name(&nickname);
    let database = services
        .provisioner
        .create_database(&database_name, true)
        .await
        .context("Failed to create temporary database")?;

    progress.advance("1", "2");
    let credentials = database.credentials();
    let details = credentials.details_block(&database.database_nickname);
    ctx.session.remember_connection_text(&details);
    ctx.credentials.set(credentials.clone());

    progress.advance("2", "3");
    let prompt = prompts::connection_test(&details, TEMPORARY_CONTEXT);
    let (general, advanced) = dispatch_to_both(
        services.general_agent.as_ref(),
        services.advanced_agent.as_ref(),
        &prompt,
        ctx.session.id().as_str(),
    )
    .await
    .context("Failed to send connection details to AI agents")?;
    deliver_replies(ctx, services, &general, &advanced);

    progress.advance("3", "4");
    let outcome = services
        .ingestor
        .upload(file, &credentials)
        .await
        .context("Failed to upload file")?;

    progress.advance("4", "5");
    share_schema_with_agents(services, ctx, &outcome.table_name, &credentials).await?;
    activate_chat(ctx);

    progress.advance("5", "6");
    progress.complete_with_message(
        "6",
        format!(
            "{} rows inserted into temporary database table {}",
            outcome.rows_inserted, outcome.table_name
        ),
    );

    Ok(TableInfo {
        table_name: outcome.table_name,
        row_count: outcome.rows_inserted,
        columns: outcome.columns,
    })
}
