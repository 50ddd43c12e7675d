//! Environment-driven configuration for remote collaborators.
//!
//! All heavy lifting happens in external services; this module collects
//! their endpoints once at startup. Values come from the environment (via
//! dotenv) with the same fallbacks the hosted deployment uses.

use std::env;

use crate::types::{DbCredentials, DbType};

/// Fallback for the general analyst endpoint when the env leaves it unset
const DEFAULT_GENERAL_AGENT_ENDPOINT: &str =
    "https://flowise.tigzig.com/api/v1/prediction/flowise-fallback-endpoint";

/// Fallback for the chat-completion proxy
const DEFAULT_RT_ENDPOINT: &str = "https://rtephemeral.hosting.tigzig.com";

/// Fallback for the SQL passthrough used by schema introspection
const DEFAULT_SQL_QUERY_ENDPOINT: &str = "https://rexdb.hosting.tigzig.com";

/// Base URL for downloading agent-produced chart files
const DEFAULT_CHART_STORAGE_BASE: &str =
    "https://flowise-coolify.hosting.tigzig.com/api/v1/get-upload-file";

/// One selectable advanced-analyst endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedEndpoint {
    pub id: u32,
    pub name: String,
    pub url: String,
    pub description: String,
    pub tier: String,
}

/// Endpoints for every remote collaborator the orchestrator talks to
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed "general" analyst agent
    pub general_agent_endpoint: String,
    /// User-selectable "advanced" analyst agents, in display order
    pub advanced_endpoints: Vec<AdvancedEndpoint>,
    /// Chat-completion proxy (credential parsing, schema inference)
    pub rt_endpoint: String,
    /// Database provisioning service base URL
    pub provision_api_url: String,
    /// Tabular file ingestion service base URL
    pub upload_api_endpoint: String,
    /// Schema introspection (SQL passthrough) base URL
    pub sql_query_endpoint: String,
    /// Chart file storage base URL
    pub chart_storage_base: String,
    /// Optional analytics webhook
    pub analytics_webhook_url: Option<String>,
    /// Shared analysis database that LLM-assisted uploads land in, when the
    /// deployment configures one
    pub shared_analysis_db: Option<DbCredentials>,
}

fn env_or(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_string())
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Advanced endpoints whose env var is unset are skipped, so the catalog
    /// only lists frameworks the deployment actually configured.
    pub fn from_env() -> Self {
        let catalog = [
            (
                1,
                "Google Gemini Flash 2.0",
                "ADV_ANALYST_ENDPOINT_GEMINI",
                "Analysis: gemini-2.0-flash / Reviewer + Executor: gpt-4o",
                "excellent perf - lowest cost",
            ),
            (
                2,
                "Deepseek-R1",
                "ADV_ANALYST_ENDPOINT_DEEPSEEK",
                "Analysis: deepseek-r1 / Reviewer + Executor: gpt-4o",
                "top level perf - higher cost",
            ),
            (
                3,
                "OpenAI o3-mini",
                "ADV_ANALYST_ENDPOINT_O3MINI",
                "Analysis: o3-mini / Reviewer + Executor: gpt-4o",
                "ok perf - low cost",
            ),
            (
                4,
                "Claude Sonnet",
                "ADV_ANALYST_ENDPOINT_CLAUDE",
                "Analysis: claude-sonnet / Reviewer + Executor: gpt-4o",
                "best performance - highest cost",
            ),
        ];

        let advanced_endpoints = catalog
            .iter()
            .filter_map(|(id, name, var, description, tier)| {
                env::var(var).ok().map(|url| AdvancedEndpoint {
                    id: *id,
                    name: (*name).to_string(),
                    url,
                    description: (*description).to_string(),
                    tier: (*tier).to_string(),
                })
            })
            .collect();

        Self {
            general_agent_endpoint: env_or(
                "FLOWISE_API_ENDPOINT",
                DEFAULT_GENERAL_AGENT_ENDPOINT,
            ),
            advanced_endpoints,
            rt_endpoint: env_or("RT_ENDPOINT", DEFAULT_RT_ENDPOINT),
            provision_api_url: env_or("NEON_API_URL", ""),
            upload_api_endpoint: env_or("UPLOAD_API_ENDPOINT", ""),
            sql_query_endpoint: env_or("SQL_QUERY_ENDPOINT", DEFAULT_SQL_QUERY_ENDPOINT),
            chart_storage_base: env_or("CHART_STORAGE_BASE", DEFAULT_CHART_STORAGE_BASE),
            analytics_webhook_url: env::var("ANALYTICS_WEBHOOK_URL").ok(),
            shared_analysis_db: shared_analysis_db_from_env(),
        }
    }

    /// Default advanced endpoint: first configured entry
    pub fn default_advanced_endpoint(&self) -> Option<&AdvancedEndpoint> {
        self.advanced_endpoints.first()
    }
}

/// Connection descriptor for the shared analysis database, present only
/// when the three required env vars are all set.
fn shared_analysis_db_from_env() -> Option<DbCredentials> {
    let host = env::var("SHARED_DB_HOST").ok()?;
    let database = env::var("SHARED_DB_NAME").ok()?;
    let user = env::var("SHARED_DB_USER").ok()?;
    let password = env::var("SHARED_DB_PASSWORD").unwrap_or_default();
    Some(DbCredentials {
        host,
        database,
        user,
        password,
        schema: env_or("SHARED_DB_SCHEMA", "public"),
        port: env_or("SHARED_DB_PORT", DbType::Postgresql.default_port()),
        db_type: DbType::Postgresql,
    })
}

/// Extract the chatflow id from a prediction endpoint URL.
///
/// Agent endpoints look like `.../api/v1/prediction/<chatflow-id>`; the
/// chart storage API needs the id on its own.
pub fn extract_chatflow_id(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("/prediction/")?;
    let id = rest.split(['/', '?']).next().unwrap_or("");
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
