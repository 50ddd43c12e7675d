//! Optional analytics webhook fired after a database is created.
//!
//! Best effort only: a webhook failure is logged and never fails the
//! enclosing workflow.

use anyhow::{Context, Result};
use serde_json::json;
use tablechat_sdk::log_warning;

use crate::services::provision::ProvisionedDatabase;
use crate::types::UserProfile;

/// Pipe-delimited record the webhook consumer expects
pub fn webhook_payload(user: &UserProfile, db: &ProvisionedDatabase) -> String {
    format!(
        "User Data|user_id: {}|user_email: {}|hostname: {}|database: {}|username: {}|port: {}|type: {}|nickname: {}",
        user.sub,
        user.email,
        db.hostname,
        db.database_name,
        db.database_owner,
        db.port,
        db.database_type,
        db.database_nickname
    )
}

pub struct AnalyticsWebhook {
    client: reqwest::Client,
    url: Option<String>,
}

impl AnalyticsWebhook {
    pub fn new(client: reqwest::Client, url: Option<String>) -> Self {
        Self { client, url }
    }

    /// Record a created database against the signed-in user, if both a
    /// webhook URL and a user profile are available.
    pub async fn record_database_created(
        &self,
        user: Option<&UserProfile>,
        db: &ProvisionedDatabase,
    ) {
        let (Some(url), Some(user)) = (self.url.as_deref(), user) else {
            return;
        };
        if let Err(err) = self.post(url, user, db).await {
            log_warning!("Failed to send data to analytics webhook: {:#}", err);
        }
    }

    async fn post(&self, url: &str, user: &UserProfile, db: &ProvisionedDatabase) -> Result<()> {
        self.client
            .post(url)
            .json(&json!({ "data": webhook_payload(user, db) }))
            .send()
            .await
            .context("webhook request failed")?
            .error_for_status()
            .context("webhook returned an error status")?;
        Ok(())
    }
}
