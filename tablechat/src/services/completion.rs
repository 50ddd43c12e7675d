//! Chat-completion proxy client for the two structured-extraction tasks:
//! turning free-text connection details into credentials, and inferring a
//! column schema from a file sample.
//!
//! The proxy speaks the standard chat-completion shape; the assistant
//! message content is itself a JSON string that gets parsed a second time.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use tablechat_sdk::async_trait;

use crate::prompts;
use crate::types::{DbCredentials, InferredSchema};

/// Model used to parse connection details
const CREDENTIAL_MODEL: &str = "gpt-4o";
/// Model used to infer file schemas
const SCHEMA_MODEL: &str = "gpt-4o-mini";

/// Structured-extraction operations backed by an LLM
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Parse free-text connection details into a validated descriptor
    async fn parse_credentials(&self, connection_text: &str) -> Result<DbCredentials>;

    /// Infer column types and descriptions for a delimited file sample
    async fn infer_schema(&self, sample_data: &str, delimiter: char) -> Result<InferredSchema>;
}

/// Reqwest-backed client for the `/open-chat-completion` proxy
pub struct OpenCompletionClient {
    client: reqwest::Client,
    rt_endpoint: String,
}

impl OpenCompletionClient {
    pub fn new(client: reqwest::Client, rt_endpoint: impl Into<String>) -> Self {
        Self {
            client,
            rt_endpoint: rt_endpoint.into(),
        }
    }

    async fn complete_json(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let mut body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": { "type": "json_object" },
        });
        // o3-family models reject an explicit temperature
        if !model.starts_with("o3") {
            body["temperature"] = json!(0.1);
        }

        let response = self
            .client
            .post(format!("{}/open-chat-completion", self.rt_endpoint))
            .json(&body)
            .send()
            .await
            .context("Failed to reach chat-completion proxy")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Completion request failed with status {status}: {text}"
            ));
        }

        let data: Value = response
            .json()
            .await
            .context("Invalid JSON from chat-completion proxy")?;
        extract_message_content(&data)
    }
}

/// Pull the assistant message content out of a chat-completion response
pub fn extract_message_content(data: &Value) -> Result<String> {
    data.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid response format from completion API"))
}

/// Parse and validate the credentials JSON the model returned
pub fn credentials_from_content(content: &str) -> Result<DbCredentials> {
    let credentials: DbCredentials = serde_json::from_str(content)
        .context("Failed to parse database credentials from AI response")?;
    credentials.validate()?;
    Ok(credentials)
}

/// Parse the inferred-schema JSON the model returned
pub fn schema_from_content(content: &str) -> Result<InferredSchema> {
    let schema: InferredSchema =
        serde_json::from_str(content).context("Failed to parse inferred schema from AI response")?;
    if schema.columns.is_empty() {
        return Err(anyhow!("Inferred schema contains no columns"));
    }
    Ok(schema)
}

#[async_trait]
impl CompletionClient for OpenCompletionClient {
    async fn parse_credentials(&self, connection_text: &str) -> Result<DbCredentials> {
        let content = self
            .complete_json(
                CREDENTIAL_MODEL,
                prompts::CREDENTIAL_PARSER_SYSTEM,
                &prompts::credential_parser(connection_text),
            )
            .await?;
        credentials_from_content(&content)
    }

    async fn infer_schema(&self, sample_data: &str, delimiter: char) -> Result<InferredSchema> {
        let content = self
            .complete_json(
                SCHEMA_MODEL,
                prompts::SCHEMA_ANALYZER_SYSTEM,
                &prompts::schema_inference(sample_data, delimiter),
            )
            .await?;
        schema_from_content(&content)
    }
}
