//! Clients for the remote collaborators. Each seam is a trait so the
//! workflows can be exercised against fakes; the implementations are thin
//! reqwest wrappers over the documented request/response contracts.

pub mod agents;
pub mod completion;
pub mod ingest;
pub mod introspect;
pub mod provision;
pub mod webhook;

use std::sync::Arc;

use agents::AnalystAgent;
use completion::CompletionClient;
use ingest::FileIngestor;
use introspect::SchemaIntrospector;
use provision::DatabaseProvisioner;

/// Bundle of service handles a workflow invocation runs against.
///
/// The advanced agent is resolved from the endpoint selection when the
/// bundle is built, so one invocation talks to one advanced framework for
/// its whole run.
#[derive(Clone)]
pub struct Services {
    pub general_agent: Arc<dyn AnalystAgent>,
    pub advanced_agent: Arc<dyn AnalystAgent>,
    pub completion: Arc<dyn CompletionClient>,
    pub provisioner: Arc<dyn DatabaseProvisioner>,
    pub ingestor: Arc<dyn FileIngestor>,
    pub introspector: Arc<dyn SchemaIntrospector>,
}
