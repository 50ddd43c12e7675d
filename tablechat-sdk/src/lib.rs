//! Progress tracking and UI signalling primitives shared by every
//! tablechat workflow: the step status model, a per-invocation progress
//! reporter publishing immutable snapshots, broadcast UI signals and the
//! console log macros.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

// Re-export async trait for convenience
pub use async_trait::async_trait;

/// Fallback explanation attached to steps that never got a chance to finish
pub const PROCESS_INTERRUPTED: &str = "Process interrupted";

/// Status of a single workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Error,
}

/// One unit of a workflow with an id, status and display message.
///
/// `aux` carries an optional display payload (e.g. a credentials block to
/// render inline after a database has been created). The SDK treats it as
/// opaque JSON; the application crate owns its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStep {
    pub id: String,
    pub message: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux: Option<serde_json::Value>,
}

impl ProgressStep {
    /// Create a pending step
    pub fn pending(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            status: StepStatus::Pending,
            error: None,
            aux: None,
        }
    }
}

/// Field-level changes applied to a single step.
///
/// `message` and `aux` replace the current value only when set; `error` is
/// cleared unless the update carries one.
#[derive(Debug, Clone, Default)]
pub struct StepUpdate {
    pub status: Option<StepStatus>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub aux: Option<serde_json::Value>,
}

impl StepUpdate {
    pub fn status(status: StepStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_aux(mut self, aux: serde_json::Value) -> Self {
        self.aux = Some(aux);
        self
    }
}

/// Ordered sequence of workflow steps for one invocation.
///
/// Steps are created fresh for every workflow run; no operation reorders
/// steps or changes their ids.
#[derive(Debug, Default)]
pub struct StepTracker {
    steps: Vec<ProgressStep>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire tracked sequence; all steps start pending
    pub fn initialize(&mut self, steps: Vec<ProgressStep>) {
        self.steps = steps
            .into_iter()
            .map(|mut step| {
                step.status = StepStatus::Pending;
                step.error = None;
                step
            })
            .collect();
    }

    /// Apply an update to the step with the given id.
    ///
    /// Unknown ids are a silent no-op: callers are expected to supply only
    /// declared ids, and a stale update must not corrupt the sequence.
    pub fn update_step(&mut self, id: &str, update: StepUpdate) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.id == id) {
            if let Some(status) = update.status {
                step.status = status;
            }
            if let Some(message) = update.message {
                step.message = message;
            }
            step.error = update.error;
            if let Some(aux) = update.aux {
                step.aux = Some(aux);
            }
        }
    }

    /// Append a step after the declared list (used for result-display steps)
    pub fn push_step(&mut self, step: ProgressStep) {
        self.steps.push(step);
    }

    /// Mark every step that has not completed as errored.
    ///
    /// Completed steps keep their status; pending and in-progress steps end
    /// as errors carrying the given explanation.
    pub fn fail_remaining(&mut self, reason: &str) {
        for step in &mut self.steps {
            if matches!(step.status, StepStatus::Pending | StepStatus::InProgress) {
                step.status = StepStatus::Error;
                step.error = Some(reason.to_string());
            }
        }
    }

    /// Empty the sequence (progress display dismissed)
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn steps(&self) -> &[ProgressStep] {
        &self.steps
    }

    pub fn snapshot(&self) -> Vec<ProgressStep> {
        self.steps.clone()
    }
}

/// Progress handle for one workflow invocation.
///
/// Each invocation owns its reporter, so concurrent runs of the same
/// workflow type never write to a shared tracker. Observers subscribe and
/// receive an immutable snapshot of the full step list after every mutation.
pub struct ProgressReporter {
    run_id: Uuid,
    tracker: Mutex<StepTracker>,
    snapshots_tx: broadcast::Sender<Vec<ProgressStep>>,
}

impl ProgressReporter {
    /// Create a reporter with the declared step list, all pending
    pub fn new(steps: Vec<ProgressStep>) -> Self {
        let (snapshots_tx, _) = broadcast::channel(64);
        let mut tracker = StepTracker::new();
        tracker.initialize(steps);
        Self {
            run_id: Uuid::new_v4(),
            tracker: Mutex::new(tracker),
            snapshots_tx,
        }
    }

    /// Identifier of the workflow invocation this reporter belongs to
    pub fn run_id(&self) -> &Uuid {
        &self.run_id
    }

    /// Subscribe to step-list snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<ProgressStep>> {
        self.snapshots_tx.subscribe()
    }

    pub fn snapshot(&self) -> Vec<ProgressStep> {
        self.tracker.lock().unwrap().snapshot()
    }

    fn publish(&self, snapshot: Vec<ProgressStep>) {
        // Nobody listening is fine; the CLI may poll snapshots instead
        let _ = self.snapshots_tx.send(snapshot);
    }

    /// Mark a step in progress
    pub fn start(&self, id: &str) {
        let snapshot = {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.update_step(id, StepUpdate::status(StepStatus::InProgress));
            tracker.snapshot()
        };
        self.publish(snapshot);
    }

    /// Mark a step completed
    pub fn complete(&self, id: &str) {
        let snapshot = {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.update_step(id, StepUpdate::status(StepStatus::Completed));
            tracker.snapshot()
        };
        self.publish(snapshot);
    }

    /// Complete a step and replace its message with a result-derived one
    pub fn complete_with_message(&self, id: &str, message: impl Into<String>) {
        let snapshot = {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.update_step(
                id,
                StepUpdate::status(StepStatus::Completed).with_message(message),
            );
            tracker.snapshot()
        };
        self.publish(snapshot);
    }

    /// Complete `done_id` and start `next_id` in one atomic update.
    ///
    /// Observers see a single snapshot, so two steps are never visible as
    /// simultaneously in progress outside the agent fan-out window.
    pub fn advance(&self, done_id: &str, next_id: &str) {
        let snapshot = {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.update_step(done_id, StepUpdate::status(StepStatus::Completed));
            tracker.update_step(next_id, StepUpdate::status(StepStatus::InProgress));
            tracker.snapshot()
        };
        self.publish(snapshot);
    }

    /// Append a step after the declared list (e.g. a credentials display)
    pub fn append_step(&self, step: ProgressStep) {
        let snapshot = {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.push_step(step);
            tracker.snapshot()
        };
        self.publish(snapshot);
    }

    /// Fail every pending/in-progress step with the given explanation
    pub fn fail_remaining(&self, reason: &str) {
        let snapshot = {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.fail_remaining(reason);
            tracker.snapshot()
        };
        self.publish(snapshot);
    }

    /// Clear the step list (progress display dismissed)
    pub fn clear(&self) {
        let snapshot = {
            let mut tracker = self.tracker.lock().unwrap();
            tracker.clear();
            tracker.snapshot()
        };
        self.publish(snapshot);
    }
}

/// Signals emitted to the rendering layer (not itself in scope here)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiSignal {
    /// The chat tab should become the active view
    ChatTabActivated,
    /// A new chart artifact is available for the charts panel
    ChartArtifactAdded { url: String, source: String },
}

/// Broadcast hub for UI-facing signals, shared across workflow invocations
pub struct SignalHub {
    tx: broadcast::Sender<UiSignal>,
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiSignal> {
        self.tx.subscribe()
    }

    pub fn emit(&self, signal: UiSignal) {
        let _ = self.tx.send(signal);
    }
}

/// Logs an informational message.
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a debug message (intended to be used conditionally).
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs the start of a workflow with a banner and description.
///
/// # Example
/// ```
/// use tablechat_sdk::log_workflow_start;
/// log_workflow_start!("Quick Connect", "Parse and validate connection details");
/// ```
#[macro_export]
macro_rules! log_workflow_start {
    ($title:expr, $description:expr) => {
        println!("\x1b[1;36m═══ {} ═══\x1b[0m", $title);
        println!("\x1b[36m{}\x1b[0m", $description);
    };
}

/// Logs the completion of a workflow.
#[macro_export]
macro_rules! log_workflow_complete {
    ($title:expr) => {
        println!("\x1b[32m✓ {} complete\x1b[0m", $title);
    };
}
