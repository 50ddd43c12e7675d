//! Domain types shared across services, stores and workflows

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database engine the credentials point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Postgresql,
    Mysql,
}

impl DbType {
    /// Default port when the connection details leave it out
    pub fn default_port(&self) -> &'static str {
        match self {
            DbType::Postgresql => "5432",
            DbType::Mysql => "3306",
        }
    }

    /// Human-readable engine name for result messages
    pub fn display_name(&self) -> &'static str {
        match self {
            DbType::Postgresql => "PostgreSQL",
            DbType::Mysql => "MySQL",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Postgresql => "postgresql",
            DbType::Mysql => "mysql",
        }
    }
}

/// Full connection descriptor for a user or temporary database.
///
/// Replaced wholesale on reconnect; there are no partial field updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbCredentials {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub schema: String,
    pub port: String,
    pub db_type: DbType,
}

impl DbCredentials {
    /// Validate a credentials object parsed from an AI response.
    ///
    /// Every field must be present and non-empty; the engine must be one of
    /// the two supported types (serde already enforces the latter).
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("host", &self.host),
            ("database", &self.database),
            ("user", &self.user),
            ("password", &self.password),
            ("schema", &self.schema),
            ("port", &self.port),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            bail!("Missing required fields: {}", missing.join(", "));
        }
        Ok(())
    }

    /// Multi-line credential block shared with the AI agents
    pub fn details_block(&self, nickname: &str) -> String {
        format!(
            "Host: {}\nDatabase: {}\nUsername: {}\nPassword: {}\nPort: {}\nType: {}\nNickname: {}",
            self.host, self.database, self.user, self.password, self.port,
            self.db_type.as_str(),
            nickname
        )
    }
}

/// Response of the tabular file ingestion service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub status: String,
    pub message: String,
    pub table_name: String,
    pub rows_inserted: u64,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Summary of the most recently uploaded table
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub table_name: String,
    pub row_count: u64,
    pub columns: Vec<String>,
}

/// One column of a table as reported by information_schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
}

/// Structure and sample rows fetched from the schema introspection service
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub structure: Vec<ColumnInfo>,
    /// Header value -> cell value, one map per sample row
    pub sample_data: Vec<std::collections::BTreeMap<String, String>>,
}

/// Column description inferred by the LLM for a local file preview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferredColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub description: String,
}

/// LLM-inferred schema for a local file sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferredSchema {
    pub columns: Vec<InferredColumn>,
}

/// Who authored a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of a conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_reasoning: Option<serde_json::Value>,
}

impl ChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            agent_reasoning: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            agent_reasoning: None,
        }
    }
}

/// Reference to a chart image produced by an agent response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Identity-provider profile, used only for the analytics webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub sub: String,
    pub email: String,
}

/// Credentials payload rendered inline in a completed progress step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsDisplay {
    pub is_credentials_display: bool,
    pub hostname: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub port: String,
    #[serde(rename = "type")]
    pub db_type: String,
    pub is_temporary: bool,
}
