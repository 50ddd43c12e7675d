//! Create Database: provision a user-owned database, then hand its
//! credentials to Quick Connect for agent validation.
//!
//! The composed Quick Connect runs in deferred mode, so the five steps
//! declared here are the only progress this workflow shows. A sixth step
//! carrying the credentials display payload is appended on success.

use anyhow::{bail, Context, Result};
use serde_json::json;

use tablechat_sdk::{log_workflow_complete, log_workflow_start, ProgressStep, PROCESS_INTERRUPTED};

use crate::services::provision::{generate_database_name, ProvisionedDatabase};
use crate::services::webhook::AnalyticsWebhook;
use crate::services::Services;
use crate::types::UserProfile;
use crate::workflows::{completed_step, quick_connect, Progress, WorkflowContext};

/// Id of the appended credentials-display step
const CREDENTIALS_STEP_ID: &str = "6";

/// Explanation attached to unfinished steps when provisioning succeeded but
/// the agent validation pass failed
const AI_ANALYSIS_FAILED: &str = "AI analysis failed";

/// Declared step list, used to initialize a managed progress display
pub fn steps() -> Vec<ProgressStep> {
    vec![
        ProgressStep::pending("1", "Creating new database..."),
        ProgressStep::pending("2", "Configuring database credentials..."),
        ProgressStep::pending("3", "Validating database connection..."),
        ProgressStep::pending("4", "Setting up AI agent connection..."),
        ProgressStep::pending("5", "Analyzing database configuration..."),
    ]
}

/// Provision a database under the given nickname and connect the agents
/// to it. The webhook call at the end is best effort and never fails the
/// workflow.
pub async fn run(
    services: &Services,
    ctx: &WorkflowContext,
    webhook: &AnalyticsWebhook,
    nickname: &str,
    user: Option<&UserProfile>,
    progress: Progress<'_>,
) -> Result<ProvisionedDatabase> {
    if nickname.trim().is_empty() {
        bail!("Please enter a database nickname");
    }

    log_workflow_start!("Create Database", "Provision a database and connect the agents");

    progress.start("1");
    let database_name = generate_database_name(nickname);
    let database = match services.provisioner.create_database(&database_name, false).await {
        Ok(database) => database,
        Err(err) => {
            progress.fail_remaining(PROCESS_INTERRUPTED);
            return Err(err).context("Failed to create database");
        }
    };

    progress.advance("1", "2");
    let details = database.details_block();

    progress.advance("2", "3");
    progress.advance("3", "4");
    let analysis_context = format!("New database created with nickname: {nickname}");
    if let Err(err) = quick_connect::run(
        services,
        ctx,
        &details,
        &analysis_context,
        Progress::deferred(),
    )
    .await
    {
        // The database exists remotely; only the validation pass failed
        progress.fail_remaining(AI_ANALYSIS_FAILED);
        return Err(err).context("Database created but AI analysis failed");
    }

    progress.advance("4", "5");
    progress.complete("5");

    let mut credentials_step = completed_step(CREDENTIALS_STEP_ID, "Database Created Successfully");
    credentials_step.aux = Some(json!(database.display(false)));
    progress.append_step(credentials_step);

    webhook.record_database_created(user, &database).await;

    log_workflow_complete!("Create Database");
    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::agents::fakes::FakeAgent;
    use crate::services::provision::fakes::FakeProvisioner;
    use crate::stores::ThreadKind;
    use crate::workflows::testing;
    use std::sync::Arc;
    use tablechat_sdk::{ProgressReporter, StepStatus};

    fn webhook() -> AnalyticsWebhook {
        AnalyticsWebhook::new(reqwest::Client::new(), None)
    }

    #[tokio::test]
    async fn happy_path_appends_the_credentials_display_step() {
        let (services, ..) = testing::services();
        let ctx = testing::context();
        let reporter = ProgressReporter::new(steps());

        let database = run(
            &services,
            &ctx,
            &webhook(),
            "Sales DB",
            None,
            Progress::managed(&reporter),
        )
        .await
        .unwrap();

        assert!(database.database_name.starts_with("neon_sales_db_"));

        let snapshot = reporter.snapshot();
        assert_eq!(snapshot.len(), 6);
        assert!(snapshot[..5]
            .iter()
            .all(|s| s.status == StepStatus::Completed));

        let display = &snapshot[5];
        assert_eq!(display.id, CREDENTIALS_STEP_ID);
        assert_eq!(display.status, StepStatus::Completed);
        let aux = display.aux.as_ref().unwrap();
        assert_eq!(aux["is_credentials_display"], true);
        assert_eq!(aux["is_temporary"], false);
        assert_eq!(aux["hostname"], "ep-test.neon.example.com");
    }

    #[tokio::test]
    async fn happy_path_connects_the_agents_to_the_new_database() {
        let (services, general, ..) = testing::services();
        let ctx = testing::context();

        run(
            &services,
            &ctx,
            &webhook(),
            "Sales DB",
            None,
            Progress::deferred(),
        )
        .await
        .unwrap();

        assert!(!ctx.credentials.is_empty());
        assert_eq!(ctx.threads.len(ThreadKind::General), 1);
        let (question, _) = general.calls.lock().unwrap()[0].clone();
        assert!(question.contains("New database created with nickname: Sales DB"));
    }

    #[tokio::test]
    async fn empty_nickname_is_rejected_before_provisioning() {
        let (services, _, _, _, provisioner, ..) = testing::services();
        let ctx = testing::context();

        let err = run(&services, &ctx, &webhook(), "  ", None, Progress::deferred())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("nickname"));
        assert_eq!(provisioner.calls(), 0);
    }

    #[tokio::test]
    async fn provisioning_failure_interrupts_every_step() {
        let (mut services, ..) = testing::services();
        services.provisioner = Arc::new(FakeProvisioner::failing());
        let ctx = testing::context();
        let reporter = ProgressReporter::new(steps());

        let result = run(
            &services,
            &ctx,
            &webhook(),
            "Sales DB",
            None,
            Progress::managed(&reporter),
        )
        .await;
        assert!(result.is_err());

        let snapshot = reporter.snapshot();
        assert_eq!(snapshot.len(), 5);
        assert!(snapshot.iter().all(|s| s.status == StepStatus::Error
            && s.error.as_deref() == Some(PROCESS_INTERRUPTED)));
    }

    #[tokio::test]
    async fn agent_failure_after_provisioning_reports_ai_analysis_failed() {
        let (mut services, ..) = testing::services();
        services.advanced_agent = Arc::new(FakeAgent::failing("advanced agent down"));
        let ctx = testing::context();
        let reporter = ProgressReporter::new(steps());

        let err = run(
            &services,
            &ctx,
            &webhook(),
            "Sales DB",
            None,
            Progress::managed(&reporter),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Database created but AI analysis failed"));

        let snapshot = reporter.snapshot();
        // Provisioning and credential steps completed before the fan-out
        assert_eq!(snapshot[0].status, StepStatus::Completed);
        assert_eq!(snapshot[4].status, StepStatus::Error);
        assert_eq!(snapshot[4].error.as_deref(), Some(AI_ANALYSIS_FAILED));
    }

    #[tokio::test]
    async fn rerun_after_failure_provisions_again() {
        let (mut services, ..) = testing::services();
        let provisioner = Arc::new(FakeProvisioner::new());
        services.provisioner = provisioner.clone();
        services.general_agent = Arc::new(FakeAgent::failing("general agent down"));
        let ctx = testing::context();

        assert!(run(&services, &ctx, &webhook(), "db", None, Progress::deferred())
            .await
            .is_err());
        assert!(run(&services, &ctx, &webhook(), "db", None, Progress::deferred())
            .await
            .is_err());

        // No resume: each attempt creates a fresh database remotely
        assert_eq!(provisioner.calls(), 2);
    }
}
