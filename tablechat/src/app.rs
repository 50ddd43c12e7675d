//! Wiring: assemble the service bundle, session context and webhook from
//! configuration. One bundle serves one workflow invocation; the advanced
//! agent is fixed at build time from the endpoint selection.

use anyhow::{Context, Result};
use std::sync::Arc;

use tablechat_sdk::SignalHub;

use crate::config::{AdvancedEndpoint, Config};
use crate::services::agents::FlowiseAgent;
use crate::services::completion::OpenCompletionClient;
use crate::services::ingest::IngestClient;
use crate::services::introspect::SqlPassthroughIntrospector;
use crate::services::provision::NeonProvisioner;
use crate::services::webhook::AnalyticsWebhook;
use crate::services::Services;
use crate::session::Session;
use crate::stores::{ChartStore, ConversationThreads, CredentialStore};
use crate::workflows::WorkflowContext;

/// Fresh session-scoped context with a generated session id
pub fn build_context(config: &Config) -> WorkflowContext {
    let signals = Arc::new(SignalHub::new());
    WorkflowContext {
        session: Arc::new(Session::new()),
        credentials: Arc::new(CredentialStore::new()),
        threads: Arc::new(ConversationThreads::new()),
        charts: Arc::new(ChartStore::new(signals.clone())),
        signals,
        chart_storage_base: config.chart_storage_base.clone(),
    }
}

/// Service bundle talking to the configured remote collaborators
pub fn build_services(config: &Config, advanced: &AdvancedEndpoint) -> Result<Services> {
    let client = reqwest::Client::new();
    Ok(Services {
        general_agent: Arc::new(FlowiseAgent::new(
            client.clone(),
            config.general_agent_endpoint.clone(),
            "general",
        )),
        advanced_agent: Arc::new(FlowiseAgent::new(
            client.clone(),
            advanced.url.clone(),
            "advanced",
        )),
        completion: Arc::new(OpenCompletionClient::new(
            client.clone(),
            config.rt_endpoint.clone(),
        )),
        provisioner: Arc::new(NeonProvisioner::new(
            client.clone(),
            config.provision_api_url.clone(),
        )),
        ingestor: Arc::new(
            IngestClient::new(config.upload_api_endpoint.clone())
                .context("Failed to build the file ingestion client")?,
        ),
        introspector: Arc::new(SqlPassthroughIntrospector::new(
            client,
            config.sql_query_endpoint.clone(),
        )),
    })
}

pub fn build_webhook(config: &Config) -> AnalyticsWebhook {
    AnalyticsWebhook::new(reqwest::Client::new(), config.analytics_webhook_url.clone())
}
