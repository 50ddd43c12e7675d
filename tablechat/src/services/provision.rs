//! Database provisioning client and naming helpers.

use anyhow::{anyhow, Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tablechat_sdk::async_trait;

use crate::types::{CredentialsDisplay, DbCredentials, DbType};

/// Response of the provisioning service for a newly created database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedDatabase {
    pub hostname: String,
    pub database_name: String,
    pub database_owner: String,
    pub database_owner_password: String,
    pub port: String,
    pub database_type: String,
    pub database_nickname: String,
}

impl ProvisionedDatabase {
    /// Connection descriptor for the new database. Provisioned databases
    /// are always PostgreSQL with the default schema.
    pub fn credentials(&self) -> DbCredentials {
        DbCredentials {
            host: self.hostname.clone(),
            database: self.database_name.clone(),
            user: self.database_owner.clone(),
            password: self.database_owner_password.clone(),
            schema: "public".to_string(),
            port: self.port.clone(),
            db_type: DbType::Postgresql,
        }
    }

    /// Credential block handed to the AI agents
    pub fn details_block(&self) -> String {
        self.credentials().details_block(&self.database_nickname)
    }

    /// Payload for the inline credentials step in the progress display
    pub fn display(&self, is_temporary: bool) -> CredentialsDisplay {
        CredentialsDisplay {
            is_credentials_display: true,
            hostname: self.hostname.clone(),
            database: self.database_name.clone(),
            username: self.database_owner.clone(),
            password: self.database_owner_password.clone(),
            port: self.port.clone(),
            db_type: self.database_type.clone(),
            is_temporary,
        }
    }
}

/// Remote service that creates user-owned or temporary databases
#[async_trait]
pub trait DatabaseProvisioner: Send + Sync {
    async fn create_database(&self, name: &str, temporary: bool) -> Result<ProvisionedDatabase>;
}

/// Reqwest-backed client for the Neon provisioning API
pub struct NeonProvisioner {
    client: reqwest::Client,
    base_url: String,
}

impl NeonProvisioner {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DatabaseProvisioner for NeonProvisioner {
    async fn create_database(&self, name: &str, temporary: bool) -> Result<ProvisionedDatabase> {
        let mut project = json!({ "name": name });
        if temporary {
            project["is_temporary"] = json!(true);
        }

        let response = self
            .client
            .post(format!("{}/api/create-neon-db", self.base_url))
            .json(&json!({ "project": project }))
            .send()
            .await
            .context("Failed to reach database provisioning service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Database provisioning failed with status {status}: {body}"
            ));
        }

        response
            .json()
            .await
            .context("Invalid response from database provisioning service")
    }
}

/// `neon_<sanitized nickname>_<5-digit random>`: lowercase the nickname and
/// replace anything outside [a-z0-9] with underscores.
pub fn generate_database_name(nickname: &str) -> String {
    let sanitized: String = nickname
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let suffix = rand::thread_rng().gen_range(10_000..100_000);
    format!("neon_{sanitized}_{suffix}")
}

/// Random human-friendly nickname for temporary databases
pub fn generate_temporary_nickname() -> String {
    const ADJECTIVES: [&str; 5] = ["temp", "quick", "instant", "rapid", "fast"];
    const NOUNS: [&str; 5] = ["analysis", "data", "project", "session", "workspace"];
    let mut rng = rand::thread_rng();
    format!(
        "{}-{}",
        ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())],
        NOUNS[rng.gen_range(0..NOUNS.len())]
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_name_is_sanitized_with_five_digit_suffix() {
        let name = generate_database_name("My Sales-DB!");
        let (prefix, suffix) = name.rsplit_once('_').unwrap();
        assert_eq!(prefix, "neon_my_sales_db_");
        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn temporary_nickname_uses_the_word_lists() {
        let nickname = generate_temporary_nickname();
        let (adjective, noun) = nickname.split_once('-').unwrap();
        assert!(["temp", "quick", "instant", "rapid", "fast"].contains(&adjective));
        assert!(["analysis", "data", "project", "session", "workspace"].contains(&noun));
    }

    #[test]
    fn provisioned_database_yields_postgres_credentials() {
        let db = ProvisionedDatabase {
            hostname: "host".to_string(),
            database_name: "db".to_string(),
            database_owner: "user".to_string(),
            database_owner_password: "pw".to_string(),
            port: "5432".to_string(),
            database_type: "postgresql".to_string(),
            database_nickname: "nick".to_string(),
        };
        let creds = db.credentials();
        assert_eq!(creds.schema, "public");
        assert_eq!(creds.db_type, DbType::Postgresql);
        assert!(db.details_block().contains("Nickname: nick"));
        assert!(db.display(true).is_temporary);
    }
}
