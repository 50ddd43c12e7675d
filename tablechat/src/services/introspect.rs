//! Schema introspection over the SQL passthrough service.
//!
//! The service executes one query against the connected database and
//! returns plain newline/comma text (first line = header), not JSON.

use anyhow::{anyhow, Context, Result};
use tablechat_sdk::async_trait;

use crate::tabular;
use crate::types::{DbCredentials, DbType, TableSchema};

/// Number of sample rows shared with the agents
const SAMPLE_LIMIT: usize = 10;

/// Column-metadata query for the given engine. MySQL scopes by the current
/// database; PostgreSQL by the schema from the credentials.
pub fn structure_query(table_name: &str, credentials: &DbCredentials) -> String {
    match credentials.db_type {
        DbType::Mysql => format!(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = '{table_name}'"
        ),
        DbType::Postgresql => format!(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_schema = '{}' AND table_name = '{table_name}'",
            credentials.schema
        ),
    }
}

/// Sample-rows query. The upload service sometimes reports table names with
/// a schema prefix already attached; strip it before re-qualifying.
pub fn sample_query(table_name: &str, credentials: &DbCredentials) -> String {
    match credentials.db_type {
        DbType::Mysql => format!("SELECT * FROM {table_name} LIMIT {SAMPLE_LIMIT}"),
        DbType::Postgresql => {
            let bare = table_name
                .strip_prefix(&format!("{}.", credentials.schema))
                .unwrap_or(table_name);
            format!(
                "SELECT * FROM {}.{bare} LIMIT {SAMPLE_LIMIT}",
                credentials.schema
            )
        }
    }
}

/// Remote schema introspection service
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Fetch column metadata and sample rows for a freshly uploaded table
    async fn table_schema(
        &self,
        table_name: &str,
        credentials: &DbCredentials,
    ) -> Result<TableSchema>;
}

/// Reqwest-backed client for the SQL passthrough endpoint
pub struct SqlPassthroughIntrospector {
    client: reqwest::Client,
    base_url: String,
}

impl SqlPassthroughIntrospector {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn run_query(&self, sqlquery: &str, credentials: &DbCredentials) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/connect-db/", self.base_url))
            .query(&[
                ("host", credentials.host.as_str()),
                ("database", credentials.database.as_str()),
                ("user", credentials.user.as_str()),
                ("password", credentials.password.as_str()),
                ("sqlquery", sqlquery),
                ("port", credentials.port.as_str()),
                ("db_type", credentials.db_type.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach schema introspection service")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Schema introspection failed with status {}",
                response.status()
            ));
        }

        response
            .text()
            .await
            .context("Failed to read schema introspection response")
    }
}

#[async_trait]
impl SchemaIntrospector for SqlPassthroughIntrospector {
    async fn table_schema(
        &self,
        table_name: &str,
        credentials: &DbCredentials,
    ) -> Result<TableSchema> {
        let structure_text = self
            .run_query(&structure_query(table_name, credentials), credentials)
            .await?;
        let sample_text = self
            .run_query(&sample_query(table_name, credentials), credentials)
            .await?;
        tabular::build_table_schema(&structure_text, &sample_text)
            .context("Failed to parse database response. Please try again.")
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DbType;

    fn credentials(db_type: DbType, schema: &str) -> DbCredentials {
        DbCredentials {
            host: "h".to_string(),
            database: "d".to_string(),
            user: "u".to_string(),
            password: "p".to_string(),
            schema: schema.to_string(),
            port: db_type.default_port().to_string(),
            db_type,
        }
    }

    #[test]
    fn postgres_structure_query_scopes_by_schema() {
        let query = structure_query("trips", &credentials(DbType::Postgresql, "sales"));
        assert!(query.contains("table_schema = 'sales'"));
        assert!(query.contains("table_name = 'trips'"));
    }

    #[test]
    fn mysql_structure_query_uses_current_database() {
        let query = structure_query("trips", &credentials(DbType::Mysql, "ignored"));
        assert!(query.contains("table_schema = DATABASE()"));
    }

    #[test]
    fn postgres_sample_query_strips_duplicate_schema_prefix() {
        let creds = credentials(DbType::Postgresql, "public");
        assert_eq!(
            sample_query("public.trips", &creds),
            "SELECT * FROM public.trips LIMIT 10"
        );
        assert_eq!(
            sample_query("trips", &creds),
            "SELECT * FROM public.trips LIMIT 10"
        );
    }

    #[test]
    fn mysql_sample_query_is_unqualified() {
        assert_eq!(
            sample_query("trips", &credentials(DbType::Mysql, "public")),
            "SELECT * FROM trips LIMIT 10"
        );
    }
}
