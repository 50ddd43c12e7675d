//! Session-scoped shared state: credentials, conversation threads, charts
//! and the advanced-endpoint selection.
//!
//! These are the only pieces of state shared across workflow invocations.
//! Each store is an explicit context object passed by reference, with a
//! subscribe interface delivering immutable snapshots; there are no ambient
//! globals.

use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use tablechat_sdk::{SignalHub, UiSignal};

use crate::config::AdvancedEndpoint;
use crate::types::{ChartArtifact, ChatMessage, DbCredentials};

/// Single-slot holder for the most recent validated or provisioned
/// connection descriptor. `set` is a total replacement.
pub struct CredentialStore {
    current: watch::Sender<Option<DbCredentials>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    pub fn set(&self, credentials: DbCredentials) {
        self.current.send_replace(Some(credentials));
    }

    pub fn get(&self) -> Option<DbCredentials> {
        self.current.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.borrow().is_none()
    }

    /// Observe replacements (reconnects) as they happen
    pub fn subscribe(&self) -> watch::Receiver<Option<DbCredentials>> {
        self.current.subscribe()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Which conversation thread a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    General,
    Advanced,
}

/// The two independent analyst conversation threads.
///
/// Append-only from the orchestrator's perspective; the UI appends
/// user-issued messages through the same interface.
pub struct ConversationThreads {
    general: Mutex<Vec<ChatMessage>>,
    advanced: Mutex<Vec<ChatMessage>>,
}

impl ConversationThreads {
    pub fn new() -> Self {
        Self {
            general: Mutex::new(Vec::new()),
            advanced: Mutex::new(Vec::new()),
        }
    }

    pub fn append(&self, kind: ThreadKind, message: ChatMessage) {
        self.thread(kind).lock().unwrap().push(message);
    }

    pub fn messages(&self, kind: ThreadKind) -> Vec<ChatMessage> {
        self.thread(kind).lock().unwrap().clone()
    }

    pub fn len(&self, kind: ThreadKind) -> usize {
        self.thread(kind).lock().unwrap().len()
    }

    pub fn is_empty(&self, kind: ThreadKind) -> bool {
        self.len(kind) == 0
    }

    fn thread(&self, kind: ThreadKind) -> &Mutex<Vec<ChatMessage>> {
        match kind {
            ThreadKind::General => &self.general,
            ThreadKind::Advanced => &self.advanced,
        }
    }
}

impl Default for ConversationThreads {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide chart list. Artifacts are appended as agents produce them
/// and never removed automatically.
pub struct ChartStore {
    charts: Mutex<Vec<ChartArtifact>>,
    signals: Arc<SignalHub>,
}

impl ChartStore {
    pub fn new(signals: Arc<SignalHub>) -> Self {
        Self {
            charts: Mutex::new(Vec::new()),
            signals,
        }
    }

    pub fn push(&self, url: impl Into<String>, source: impl Into<String>) -> ChartArtifact {
        let artifact = ChartArtifact {
            url: url.into(),
            timestamp: Utc::now(),
            source: source.into(),
        };
        self.charts.lock().unwrap().push(artifact.clone());
        self.signals.emit(UiSignal::ChartArtifactAdded {
            url: artifact.url.clone(),
            source: artifact.source.clone(),
        });
        artifact
    }

    pub fn charts(&self) -> Vec<ChartArtifact> {
        self.charts.lock().unwrap().clone()
    }
}

/// Currently selected advanced-analyst endpoint, visible across independent
/// consumers without prop threading.
pub struct EndpointStore {
    selected: watch::Sender<Option<AdvancedEndpoint>>,
}

impl EndpointStore {
    pub fn new(default: Option<AdvancedEndpoint>) -> Self {
        let (selected, _) = watch::channel(default);
        Self { selected }
    }

    pub fn select(&self, endpoint: AdvancedEndpoint) {
        self.selected.send_replace(Some(endpoint));
    }

    pub fn selected(&self) -> Option<AdvancedEndpoint> {
        self.selected.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AdvancedEndpoint>> {
        self.selected.subscribe()
    }
}
