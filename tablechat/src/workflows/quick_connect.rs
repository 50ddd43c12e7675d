//! Quick Connect: turn free-text connection details into validated
//! credentials and have both analyst agents test the connection.

use anyhow::{bail, Context, Result};

use tablechat_sdk::{log_workflow_complete, log_workflow_start, ProgressStep, PROCESS_INTERRUPTED};

use crate::prompts;
use crate::services::agents::dispatch_to_both;
use crate::services::Services;
use crate::types::DbCredentials;
use crate::workflows::{activate_chat, deliver_replies, Progress, WorkflowContext};

/// Declared step list, used to initialize a managed progress display
pub fn steps() -> Vec<ProgressStep> {
    vec![
        ProgressStep::pending("1", "Parsing connection details..."),
        ProgressStep::pending("2", "Validating credentials..."),
        ProgressStep::pending("3", "Sending to AI agents for analysis..."),
        ProgressStep::pending("4", "Receiving and processing AI responses..."),
    ]
}

/// Parse, validate, store and agent-test the supplied connection details.
///
/// `additional_context` is extra prose appended to the agent instruction
/// (e.g. the nickname of a database created moments earlier). Validation
/// happens before any network call; the credential store is only written
/// once the details parsed and validated, and the conversation threads are
/// only written once both agents replied.
pub async fn run(
    services: &Services,
    ctx: &WorkflowContext,
    connection_text: &str,
    additional_context: &str,
    progress: Progress<'_>,
) -> Result<DbCredentials> {
    if connection_text.trim().is_empty() {
        bail!("Please enter database connection details");
    }

    log_workflow_start!("Quick Connect", "Parse and validate connection details");

    let result = execute(services, ctx, connection_text, additional_context, progress).await;
    if result.is_err() {
        progress.fail_remaining(PROCESS_INTERRUPTED);
    } else {
        log_workflow_complete!("Quick Connect");
    }
    result
}

async fn execute(
    services: &Services,
    ctx: &WorkflowContext,
    connection_text: &str,
    additional_context: &str,
    progress: Progress<'_>,
) -> Result<DbCredentials> {
    progress.start("1");
    let credentials = services
        .completion
        .parse_credentials(connection_text)
        .await
        .context("Failed to process database credentials")?;

    progress.advance("1", "2");
    // parse_credentials already validated field presence; what remains is
    // recording the connection for reconnect pre-fill and replacing the slot
    ctx.session.remember_connection_text(connection_text);
    ctx.credentials.set(credentials.clone());

    progress.advance("2", "3");
    let prompt = prompts::connection_test(connection_text, additional_context);
    let (general, advanced) = dispatch_to_both(
        services.general_agent.as_ref(),
        services.advanced_agent.as_ref(),
        &prompt,
        ctx.session.id().as_str(),
    )
    .await
    .context("Failed to send connection details to AI agents")?;

    progress.advance("3", "4");
    deliver_replies(ctx, services, &general, &advanced);
    activate_chat(ctx);
    progress.complete("4");

    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::agents::fakes::FakeAgent;
    use crate::services::completion::fakes::FakeCompletion;
    use crate::stores::ThreadKind;
    use crate::workflows::testing;
    use std::sync::Arc;
    use tablechat_sdk::{ProgressReporter, StepStatus, UiSignal};
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn happy_path_stores_credentials_and_fills_both_threads() {
        let (services, general, advanced, ..) = testing::services();
        let ctx = testing::context();
        let reporter = ProgressReporter::new(steps());

        let credentials = run(
            &services,
            &ctx,
            "postgres at db.example.com, user analyst",
            "",
            Progress::managed(&reporter),
        )
        .await
        .unwrap();

        assert_eq!(credentials.host, "db.example.com");
        assert_eq!(ctx.credentials.get(), Some(credentials));
        assert_eq!(
            ctx.session.connection_text().as_deref(),
            Some("postgres at db.example.com, user analyst")
        );

        // One message per thread, same session to both agents
        assert_eq!(ctx.threads.len(ThreadKind::General), 1);
        assert_eq!(ctx.threads.len(ThreadKind::Advanced), 1);
        assert_eq!(general.sessions_seen(), vec!["session-under-test"]);
        assert_eq!(advanced.sessions_seen(), vec!["session-under-test"]);

        assert!(reporter
            .snapshot()
            .iter()
            .all(|s| s.status == StepStatus::Completed));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_network_call() {
        let (services, general, _, completion, ..) = testing::services();
        let ctx = testing::context();
        let reporter = ProgressReporter::new(steps());

        let err = run(&services, &ctx, "   ", "", Progress::managed(&reporter))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("connection details"));
        assert_eq!(completion.calls(), 0);
        assert_eq!(general.sessions_seen().len(), 0);
        assert!(ctx.credentials.is_empty());
    }

    #[tokio::test]
    async fn parse_failure_marks_remaining_steps_interrupted() {
        let (mut services, ..) = testing::services();
        services.completion = Arc::new(FakeCompletion::failing("model unavailable"));
        let ctx = testing::context();
        let reporter = ProgressReporter::new(steps());

        let result = run(
            &services,
            &ctx,
            "some details",
            "",
            Progress::managed(&reporter),
        )
        .await;
        assert!(result.is_err());

        let snapshot = reporter.snapshot();
        assert!(snapshot.iter().all(|s| s.status == StepStatus::Error));
        assert!(snapshot
            .iter()
            .all(|s| s.error.as_deref() == Some(PROCESS_INTERRUPTED)));
        assert!(ctx.credentials.is_empty());
    }

    #[tokio::test]
    async fn one_agent_failing_leaves_both_threads_untouched() {
        let (mut services, ..) = testing::services();
        services.advanced_agent = Arc::new(FakeAgent::failing("advanced agent down"));
        let ctx = testing::context();
        let reporter = ProgressReporter::new(steps());

        let result = run(
            &services,
            &ctx,
            "some details",
            "",
            Progress::managed(&reporter),
        )
        .await;
        assert!(result.is_err());

        // No partial credit: neither reply reaches the threads
        assert_eq!(ctx.threads.len(ThreadKind::General), 0);
        assert_eq!(ctx.threads.len(ThreadKind::Advanced), 0);
        // Credentials were already validated and stored before the fan-out;
        // that side effect stands
        assert!(!ctx.credentials.is_empty());
    }

    #[tokio::test]
    async fn success_emits_the_chat_tab_signal_exactly_once() {
        let (services, ..) = testing::services();
        let ctx = testing::context();
        let mut signals = ctx.signals.subscribe();

        run(&services, &ctx, "details", "", Progress::deferred())
            .await
            .unwrap();

        assert_eq!(signals.recv().await.unwrap(), UiSignal::ChatTabActivated);
        // No second activation (or any other signal) for the same run
        assert!(matches!(signals.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn concurrent_runs_never_interleave_their_reporters() {
        let (services_a, ..) = testing::services();
        let (services_b, ..) = testing::services();
        let ctx_a = testing::context();
        let ctx_b = testing::context();

        // Same step ids, distinguishable messages
        let tagged = |tag: &str| {
            steps()
                .into_iter()
                .map(|mut step| {
                    step.message = format!("{tag} {}", step.message);
                    step
                })
                .collect::<Vec<_>>()
        };
        let reporter_a = ProgressReporter::new(tagged("first:"));
        let reporter_b = ProgressReporter::new(tagged("second:"));
        assert_ne!(reporter_a.run_id(), reporter_b.run_id());
        let mut rx_a = reporter_a.subscribe();
        let mut rx_b = reporter_b.subscribe();

        let (result_a, result_b) = tokio::join!(
            run(
                &services_a,
                &ctx_a,
                "details a",
                "",
                Progress::managed(&reporter_a),
            ),
            run(
                &services_b,
                &ctx_b,
                "details b",
                "",
                Progress::managed(&reporter_b),
            ),
        );
        result_a.unwrap();
        result_b.unwrap();

        // Every snapshot either reporter published holds only its own run's
        // steps; the other invocation never wrote into it
        let mut seen_a = 0;
        while let Ok(snapshot) = rx_a.try_recv() {
            seen_a += 1;
            assert_eq!(snapshot.len(), 4);
            assert!(snapshot.iter().all(|s| s.message.starts_with("first:")));
        }
        assert!(seen_a > 0);
        while let Ok(snapshot) = rx_b.try_recv() {
            assert_eq!(snapshot.len(), 4);
            assert!(snapshot.iter().all(|s| s.message.starts_with("second:")));
        }

        assert!(reporter_a
            .snapshot()
            .iter()
            .all(|s| s.status == StepStatus::Completed));
        assert!(reporter_b
            .snapshot()
            .iter()
            .all(|s| s.status == StepStatus::Completed));
    }

    #[tokio::test]
    async fn deferred_mode_performs_the_work_without_step_tracking() {
        let (services, ..) = testing::services();
        let ctx = testing::context();

        run(&services, &ctx, "details", "extra context", Progress::deferred())
            .await
            .unwrap();

        assert!(!ctx.credentials.is_empty());
        assert_eq!(ctx.threads.len(ThreadKind::General), 1);
    }

    #[tokio::test]
    async fn reconnect_replaces_the_stored_credentials() {
        let (services, ..) = testing::services();
        let ctx = testing::context();

        run(&services, &ctx, "first connection", "", Progress::deferred())
            .await
            .unwrap();
        let first = ctx.credentials.get().unwrap();

        let (mut services_b, ..) = testing::services();
        services_b.completion = Arc::new(FakeCompletion::postgres("other.example.com"));
        run(
            &services_b,
            &ctx,
            "second connection",
            "",
            Progress::deferred(),
        )
        .await
        .unwrap();

        let second = ctx.credentials.get().unwrap();
        assert_ne!(first.host, second.host);
        assert_eq!(second.host, "other.example.com");
        // Threads keep accumulating across reconnects
        assert_eq!(ctx.threads.len(ThreadKind::General), 2);
    }
}
