//! Analyst agent clients and the dual-agent dispatcher.
//!
//! Every analyst request is a `{question, overrideConfig:{sessionId}}` POST;
//! the reply is an untyped JSON object exposing `text` or `message`, an
//! optional `agentReasoning` trace and chart artifacts at arbitrary depth.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use tablechat_sdk::async_trait;

use crate::artifacts;

/// Untyped agent response plus typed accessors for the fields the
/// orchestrator consumes. The raw value is kept for artifact discovery.
#[derive(Debug, Clone)]
pub struct AgentReply {
    raw: Value,
}

impl AgentReply {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Primary text: `text` preferred, `message` as fallback
    pub fn content(&self) -> Option<&str> {
        self.raw
            .get("text")
            .and_then(Value::as_str)
            .or_else(|| self.raw.get("message").and_then(Value::as_str))
    }

    pub fn agent_reasoning(&self) -> Option<&Value> {
        self.raw.get("agentReasoning")
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.raw.get("chatId").and_then(Value::as_str)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Resolve every renderable chart artifact in the reply to a URL
    pub fn chart_urls(&self, storage_base: &str, chatflow_id: Option<&str>) -> Vec<String> {
        artifacts::find_artifacts(&self.raw)
            .iter()
            .filter_map(artifacts::image_data)
            .map(|(_, data)| {
                artifacts::image_url(data, storage_base, chatflow_id, self.chat_id())
            })
            .collect()
    }
}

/// A remote conversational analyst endpoint
#[async_trait]
pub trait AnalystAgent: Send + Sync {
    /// Send one instruction, scoped by the session id that keys the
    /// server-side conversation memory
    async fn ask(&self, question: &str, session_id: &str) -> Result<AgentReply>;

    /// Endpoint URL, used to derive the chatflow id for chart downloads
    fn endpoint_url(&self) -> &str;
}

/// Reqwest-backed Flowise prediction endpoint client
pub struct FlowiseAgent {
    client: reqwest::Client,
    endpoint: String,
    label: String,
}

impl FlowiseAgent {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            label: label.into(),
        }
    }
}

#[async_trait]
impl AnalystAgent for FlowiseAgent {
    async fn ask(&self, question: &str, session_id: &str) -> Result<AgentReply> {
        let body = json!({
            "question": question,
            "overrideConfig": { "sessionId": session_id }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {} analyst agent", self.label))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "{} analyst agent returned status {}",
                self.label,
                response.status()
            ));
        }

        let raw: Value = response
            .json()
            .await
            .with_context(|| format!("Invalid JSON from {} analyst agent", self.label))?;
        Ok(AgentReply::new(raw))
    }

    fn endpoint_url(&self) -> &str {
        &self.endpoint
    }
}

/// Fan one instruction out to both analyst agents concurrently.
///
/// Both calls carry the same session id and are joined before returning;
/// failure of either call fails the pair, so callers never act on a
/// partial success. There is no per-agent fallback.
pub async fn dispatch_to_both(
    general: &dyn AnalystAgent,
    advanced: &dyn AnalystAgent,
    question: &str,
    session_id: &str,
) -> Result<(AgentReply, AgentReply)> {
    futures::future::try_join(
        general.ask(question, session_id),
        advanced.ask(question, session_id),
    )
    .await
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted analyst agent recording every question/session pair
    pub struct FakeAgent {
        pub calls: Mutex<Vec<(String, String)>>,
        pub call_count: AtomicUsize,
        reply: Result<Value, String>,
        endpoint: String,
    }

    impl FakeAgent {
        pub fn replying(raw: Value) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
                reply: Ok(raw),
                endpoint: "https://flowise.example.com/api/v1/prediction/fake-flow".to_string(),
            }
        }

        pub fn with_text(text: &str) -> Self {
            Self::replying(json!({ "text": text, "chatId": "chat-1" }))
        }

        pub fn failing(message: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
                reply: Err(message.to_string()),
                endpoint: "https://flowise.example.com/api/v1/prediction/fake-flow".to_string(),
            }
        }

        pub fn sessions_seen(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, session)| session.clone())
                .collect()
        }
    }

    #[async_trait]
    impl AnalystAgent for FakeAgent {
        async fn ask(&self, question: &str, session_id: &str) -> Result<AgentReply> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((question.to_string(), session_id.to_string()));
            match &self.reply {
                Ok(raw) => Ok(AgentReply::new(raw.clone())),
                Err(message) => Err(anyhow!("{message}")),
            }
        }

        fn endpoint_url(&self) -> &str {
            &self.endpoint
        }
    }
}
