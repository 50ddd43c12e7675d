//! Tabular file ingestion client.
//!
//! Uploads are multipart POSTs with the connection descriptor passed as
//! query parameters. The endpoint path depends on the engine, or on the
//! LLM-assisted mode where the service infers the schema itself. Large
//! files take a while to load server-side, hence the long fixed timeout.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::time::Duration;
use tablechat_sdk::async_trait;

use crate::types::{DbCredentials, DbType, UploadOutcome};

/// Upload timeout: server-side ingestion of large files is slow
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(900);

/// Endpoint path for explicit-credentials uploads, by engine
pub fn upload_path(db_type: DbType) -> &'static str {
    match db_type {
        DbType::Postgresql => "/upload-file-custom-db-pg/",
        DbType::Mysql => "/upload-file-custom-db-mysql/",
    }
}

/// Endpoint path for LLM-assisted uploads (service picks the target)
pub const LLM_UPLOAD_PATH: &str = "/upload-file-llm-pg/";

/// Remote service that loads a tabular file into a database table
#[async_trait]
pub trait FileIngestor: Send + Sync {
    /// Upload into the database described by `credentials`
    async fn upload(&self, file: &Path, credentials: &DbCredentials) -> Result<UploadOutcome>;

    /// Upload without explicit credentials; the service infers the schema
    /// and loads into the shared analysis database
    async fn upload_llm_assisted(&self, file: &Path) -> Result<UploadOutcome>;
}

/// Reqwest-backed ingestion client
pub struct IngestClient {
    client: reqwest::Client,
    base_url: String,
}

impl IngestClient {
    /// Build a client with the long upload timeout applied
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .context("Failed to build upload HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn form_for(&self, file: &Path) -> Result<reqwest::multipart::Form> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Upload path has no usable file name: {}", file.display()))?
            .to_string();
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read upload file {}", file.display()))?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        Ok(reqwest::multipart::Form::new().part("file", part))
    }

    async fn send(
        &self,
        url: String,
        query: &[(&str, &str)],
        form: reqwest::multipart::Form,
    ) -> Result<UploadOutcome> {
        let response = self
            .client
            .post(url)
            .query(query)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach file ingestion service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("File upload failed with status {status}: {body}"));
        }

        let outcome: UploadOutcome = response
            .json()
            .await
            .context("Invalid response from file ingestion service")?;
        if !outcome.is_success() {
            return Err(anyhow!("File upload failed: {}", outcome.message));
        }
        Ok(outcome)
    }
}

#[async_trait]
impl FileIngestor for IngestClient {
    async fn upload(&self, file: &Path, credentials: &DbCredentials) -> Result<UploadOutcome> {
        let form = self.form_for(file).await?;
        let url = format!("{}{}", self.base_url, upload_path(credentials.db_type));
        self.send(
            url,
            &[
                ("host", credentials.host.as_str()),
                ("database", credentials.database.as_str()),
                ("user", credentials.user.as_str()),
                ("password", credentials.password.as_str()),
                ("schema", credentials.schema.as_str()),
                ("port", credentials.port.as_str()),
            ],
            form,
        )
        .await
    }

    async fn upload_llm_assisted(&self, file: &Path) -> Result<UploadOutcome> {
        let form = self.form_for(file).await?;
        let url = format!("{}{}", self.base_url, LLM_UPLOAD_PATH);
        self.send(url, &[], form).await
    }
}
