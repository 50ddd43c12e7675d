//! The four user-triggered workflows and the plumbing they share.
//!
//! Each workflow declares its step list, runs its network operations
//! strictly in order (with the single dual-agent fan-out), advances the
//! per-invocation progress reporter atomically and short-circuits on the
//! first failure. Side effects are never rolled back and nothing is
//! retried automatically; re-running a failed workflow re-executes every
//! step, including ones that already took effect remotely.

pub mod analyze_file;
pub mod create_db;
pub mod push_to_db;
pub mod quick_connect;
pub mod temp_db;

use anyhow::{Context as _, Result};
use std::sync::Arc;

use tablechat_sdk::{ProgressReporter, ProgressStep, SignalHub, StepStatus, UiSignal};

use crate::config;
use crate::services::agents::{dispatch_to_both, AgentReply};
use crate::services::Services;
use crate::session::Session;
use crate::stores::{ChartStore, ConversationThreads, CredentialStore, ThreadKind};
use crate::prompts;
use crate::tabular;
use crate::types::{ChatMessage, DbCredentials};

/// Session-scoped state a workflow invocation reads and mutates
pub struct WorkflowContext {
    pub session: Arc<Session>,
    pub credentials: Arc<CredentialStore>,
    pub threads: Arc<ConversationThreads>,
    pub charts: Arc<ChartStore>,
    pub signals: Arc<SignalHub>,
    /// Base URL for resolving chart storage references
    pub chart_storage_base: String,
}

/// Progress handle a workflow writes through.
///
/// `Deferred` is the composition mode: the workflow performs its
/// operations but leaves all step tracking to the outer caller.
#[derive(Clone, Copy)]
pub struct Progress<'a> {
    reporter: Option<&'a ProgressReporter>,
}

impl<'a> Progress<'a> {
    pub fn managed(reporter: &'a ProgressReporter) -> Self {
        Self {
            reporter: Some(reporter),
        }
    }

    pub fn deferred() -> Self {
        Self { reporter: None }
    }

    pub fn start(&self, id: &str) {
        if let Some(reporter) = self.reporter {
            reporter.start(id);
        }
    }

    pub fn advance(&self, done_id: &str, next_id: &str) {
        if let Some(reporter) = self.reporter {
            reporter.advance(done_id, next_id);
        }
    }

    pub fn complete(&self, id: &str) {
        if let Some(reporter) = self.reporter {
            reporter.complete(id);
        }
    }

    pub fn complete_with_message(&self, id: &str, message: impl Into<String>) {
        if let Some(reporter) = self.reporter {
            reporter.complete_with_message(id, message);
        }
    }

    pub fn append_step(&self, step: ProgressStep) {
        if let Some(reporter) = self.reporter {
            reporter.append_step(step);
        }
    }

    pub fn fail_remaining(&self, reason: &str) {
        if let Some(reporter) = self.reporter {
            reporter.fail_remaining(reason);
        }
    }
}

/// Append both agent replies to their threads and harvest any chart
/// artifacts they carry. Called only after both calls succeeded, so a
/// partial pair never reaches the threads.
pub(crate) fn deliver_replies(
    ctx: &WorkflowContext,
    services: &Services,
    general: &AgentReply,
    advanced: &AgentReply,
) {
    for (kind, source, agent, reply) in [
        (
            ThreadKind::General,
            "general",
            services.general_agent.as_ref(),
            general,
        ),
        (
            ThreadKind::Advanced,
            "advanced",
            services.advanced_agent.as_ref(),
            advanced,
        ),
    ] {
        let mut message =
            ChatMessage::assistant(reply.content().unwrap_or("Schema analysis complete"));
        message.agent_reasoning = reply.agent_reasoning().cloned();
        ctx.threads.append(kind, message);

        let chatflow_id = config::extract_chatflow_id(agent.endpoint_url());
        for url in reply.chart_urls(&ctx.chart_storage_base, chatflow_id) {
            ctx.charts.push(url, source);
        }
    }
}

/// Introspect a freshly uploaded table and share its schema with both
/// agents, appending their acknowledgements to the threads.
pub(crate) async fn share_schema_with_agents(
    services: &Services,
    ctx: &WorkflowContext,
    table_name: &str,
    credentials: &DbCredentials,
) -> Result<()> {
    let schema = services
        .introspector
        .table_schema(table_name, credentials)
        .await?;

    let prompt = prompts::schema_share(
        table_name,
        &tabular::format_structure(&schema.structure),
        &tabular::format_sample_data(&schema.sample_data),
    );

    let (general, advanced) = dispatch_to_both(
        services.general_agent.as_ref(),
        services.advanced_agent.as_ref(),
        &prompt,
        ctx.session.id().as_str(),
    )
    .await
    .context("Failed to send schema to AI agents")?;

    deliver_replies(ctx, services, &general, &advanced);
    Ok(())
}

/// Fire the "chat tab should activate" signal
pub(crate) fn activate_chat(ctx: &WorkflowContext) {
    ctx.signals.emit(UiSignal::ChatTabActivated);
}

/// A completed step carrying no aux payload, for appended result steps
pub(crate) fn completed_step(id: &str, message: &str) -> ProgressStep {
    let mut step = ProgressStep::pending(id, message);
    step.status = StepStatus::Completed;
    step
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::services::agents::fakes::FakeAgent;
    use crate::services::completion::fakes::FakeCompletion;
    use crate::services::ingest::fakes::FakeIngestor;
    use crate::services::introspect::fakes::FakeIntrospector;
    use crate::services::provision::fakes::FakeProvisioner;

    /// Context over fresh stores and a fixed session id
    pub fn context() -> WorkflowContext {
        let signals = Arc::new(SignalHub::new());
        WorkflowContext {
            session: Arc::new(Session::with_id("session-under-test".to_string().into())),
            credentials: Arc::new(CredentialStore::new()),
            threads: Arc::new(ConversationThreads::new()),
            charts: Arc::new(ChartStore::new(signals.clone())),
            signals,
            chart_storage_base: "https://charts.example.com/get".to_string(),
        }
    }

    /// All-happy-path fakes; tests swap individual fields as needed
    pub fn services() -> (
        Services,
        Arc<FakeAgent>,
        Arc<FakeAgent>,
        Arc<FakeCompletion>,
        Arc<FakeProvisioner>,
        Arc<FakeIngestor>,
        Arc<FakeIntrospector>,
    ) {
        let general = Arc::new(FakeAgent::with_text("general reply"));
        let advanced = Arc::new(FakeAgent::with_text("advanced reply"));
        let completion = Arc::new(FakeCompletion::postgres("db.example.com"));
        let provisioner = Arc::new(FakeProvisioner::new());
        let ingestor = Arc::new(FakeIngestor::succeeding("public.trips", 1542));
        let introspector = Arc::new(FakeIntrospector::new());
        let services = Services {
            general_agent: general.clone(),
            advanced_agent: advanced.clone(),
            completion: completion.clone(),
            provisioner: provisioner.clone(),
            ingestor: ingestor.clone(),
            introspector: introspector.clone(),
        };
        (
            services,
            general,
            advanced,
            completion,
            provisioner,
            ingestor,
            introspector,
        )
    }
}
