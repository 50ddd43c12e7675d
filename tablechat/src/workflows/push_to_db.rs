//! Push To Database: upload a tabular file into the connected database,
//! then introspect the new table and brief both agents on it.
//!
//! When no database is connected yet the workflow short-circuits before
//! any network call and reports that a database choice is needed; the
//! caller decides what to offer (connect an existing database or create
//! a temporary one).

use anyhow::{Context, Result};
use std::path::Path;

use tablechat_sdk::{log_workflow_complete, log_workflow_start, ProgressStep, PROCESS_INTERRUPTED};

use crate::services::Services;
use crate::types::{DbCredentials, TableInfo};
use crate::workflows::{activate_chat, share_schema_with_agents, Progress, WorkflowContext};

/// What a push attempt produced
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// No connected database; nothing was uploaded
    AwaitingDatabaseChoice,
    /// File uploaded and agents briefed on the new table
    Completed(TableInfo),
}

/// Declared step list, used to initialize a managed progress display
pub fn steps() -> Vec<ProgressStep> {
    vec![
        ProgressStep::pending("1", "Uploading file to database..."),
        ProgressStep::pending("2", "Analyzing table schema..."),
        ProgressStep::pending("3", "Finalizing upload..."),
    ]
}

pub async fn run(
    services: &Services,
    ctx: &WorkflowContext,
    file: &Path,
    progress: Progress<'_>,
) -> Result<PushOutcome> {
    let Some(credentials) = ctx.credentials.get() else {
        return Ok(PushOutcome::AwaitingDatabaseChoice);
    };

    log_workflow_start!("Push To Database", "Upload a file into the connected database");

    let result = execute(services, ctx, file, &credentials, progress).await;
    if result.is_err() {
        progress.fail_remaining(PROCESS_INTERRUPTED);
    } else {
        log_workflow_complete!("Push To Database");
    }
    result.map(PushOutcome::Completed)
}

async fn execute(
    services: &Services,
    ctx: &WorkflowContext,
    file: &Path,
    credentials: &DbCredentials,
    progress: Progress<'_>,
) -> Result<TableInfo> {
    progress.start("1");
    let outcome = services
        .ingestor
        .upload(file, credentials)
        .await
        .context("Failed to upload file")?;

    // Re-assert the slot so the upload target stays the active connection
    ctx.credentials.set(credentials.clone());

    progress.advance("1", "2");
    share_schema_with_agents(services, ctx, &outcome.table_name, credentials).await?;
    activate_chat(ctx);

    progress.advance("2", "3");
    progress.complete_with_message(
        "3",
        format!(
            "{} rows inserted into {} table {}",
            outcome.rows_inserted,
            credentials.db_type.display_name(),
            outcome.table_name
        ),
    );

    Ok(TableInfo {
        table_name: outcome.table_name,
        row_count: outcome.rows_inserted,
        columns: outcome.columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ingest::fakes::FakeIngestor;
    use crate::services::introspect::fakes::FakeIntrospector;
    use crate::stores::ThreadKind;
    use crate::types::{DbCredentials, DbType};
    use crate::workflows::testing;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tablechat_sdk::{ProgressReporter, StepStatus, UiSignal};
    use tokio::sync::broadcast::error::TryRecvError;

    fn connected_credentials() -> DbCredentials {
        DbCredentials {
            host: "db.example.com".to_string(),
            database: "analytics".to_string(),
            user: "analyst".to_string(),
            password: "pw".to_string(),
            schema: "public".to_string(),
            port: "5432".to_string(),
            db_type: DbType::Postgresql,
        }
    }

    #[tokio::test]
    async fn without_a_connection_no_network_call_is_made() {
        let (services, general, _, _, _, ingestor, introspector) = testing::services();
        let ctx = testing::context();
        let reporter = ProgressReporter::new(steps());

        let outcome = run(
            &services,
            &ctx,
            &PathBuf::from("trips.csv"),
            Progress::managed(&reporter),
        )
        .await
        .unwrap();

        assert_eq!(outcome, PushOutcome::AwaitingDatabaseChoice);
        assert_eq!(ingestor.calls(), 0);
        assert_eq!(introspector.calls(), 0);
        assert_eq!(general.sessions_seen().len(), 0);
        // The declared steps are untouched
        assert!(reporter
            .snapshot()
            .iter()
            .all(|s| s.status == StepStatus::Pending));
    }

    #[tokio::test]
    async fn happy_path_reports_the_row_count_in_the_final_step() {
        let (services, ..) = testing::services();
        let ctx = testing::context();
        ctx.credentials.set(connected_credentials());
        let reporter = ProgressReporter::new(steps());

        let outcome = run(
            &services,
            &ctx,
            &PathBuf::from("trips.csv"),
            Progress::managed(&reporter),
        )
        .await
        .unwrap();

        let PushOutcome::Completed(table) = outcome else {
            panic!("expected a completed push");
        };
        assert_eq!(table.table_name, "public.trips");
        assert_eq!(table.row_count, 1542);

        let snapshot = reporter.snapshot();
        assert!(snapshot.iter().all(|s| s.status == StepStatus::Completed));
        assert_eq!(
            snapshot[2].message,
            "1542 rows inserted into PostgreSQL table public.trips"
        );
    }

    #[tokio::test]
    async fn happy_path_briefs_both_agents_on_the_schema() {
        let (services, general, advanced, ..) = testing::services();
        let ctx = testing::context();
        ctx.credentials.set(connected_credentials());
        let mut signals = ctx.signals.subscribe();

        run(
            &services,
            &ctx,
            &PathBuf::from("trips.csv"),
            Progress::deferred(),
        )
        .await
        .unwrap();

        // Chat activation fires exactly once per successful push
        assert_eq!(signals.recv().await.unwrap(), UiSignal::ChatTabActivated);
        assert!(matches!(signals.try_recv(), Err(TryRecvError::Empty)));

        assert_eq!(ctx.threads.len(ThreadKind::General), 1);
        assert_eq!(ctx.threads.len(ThreadKind::Advanced), 1);
        let (question, session) = general.calls.lock().unwrap()[0].clone();
        assert!(question.contains("Newly uploaded table name: public.trips"));
        assert_eq!(session, "session-under-test");
        assert_eq!(advanced.call_count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upload_failure_interrupts_the_remaining_steps() {
        let (mut services, ..) = testing::services();
        services.ingestor = Arc::new(FakeIngestor::failing("disk full"));
        let ctx = testing::context();
        ctx.credentials.set(connected_credentials());
        let reporter = ProgressReporter::new(steps());

        let result = run(
            &services,
            &ctx,
            &PathBuf::from("trips.csv"),
            Progress::managed(&reporter),
        )
        .await;
        assert!(result.is_err());

        let snapshot = reporter.snapshot();
        assert!(snapshot.iter().all(|s| s.status == StepStatus::Error
            && s.error.as_deref() == Some(PROCESS_INTERRUPTED)));
    }

    #[tokio::test]
    async fn introspection_failure_leaves_the_upload_step_completed() {
        let (mut services, ..) = testing::services();
        services.introspector = Arc::new(FakeIntrospector::failing());
        let ctx = testing::context();
        ctx.credentials.set(connected_credentials());
        let reporter = ProgressReporter::new(steps());

        let result = run(
            &services,
            &ctx,
            &PathBuf::from("trips.csv"),
            Progress::managed(&reporter),
        )
        .await;
        assert!(result.is_err());

        let snapshot = reporter.snapshot();
        // The upload took effect remotely and stays marked completed
        assert_eq!(snapshot[0].status, StepStatus::Completed);
        assert_eq!(snapshot[1].status, StepStatus::Error);
        assert_eq!(snapshot[2].status, StepStatus::Error);
    }

    #[tokio::test]
    async fn rerun_after_failure_uploads_again() {
        let (mut services, ..) = testing::services();
        services.introspector = Arc::new(FakeIntrospector::failing());
        let ingestor = Arc::new(FakeIngestor::succeeding("public.trips", 10));
        services.ingestor = ingestor.clone();
        let ctx = testing::context();
        ctx.credentials.set(connected_credentials());

        for _ in 0..2 {
            assert!(run(
                &services,
                &ctx,
                &PathBuf::from("trips.csv"),
                Progress::deferred(),
            )
            .await
            .is_err());
        }

        // Retrying is a full re-execution; the table is loaded twice
        assert_eq!(ingestor.calls(), 2);
    }
}
