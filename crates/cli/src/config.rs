//! Environment-driven configuration for the import CLI.

use anyhow::Context;

use renku_core::import::POLL_INTERVAL_SECS;

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Base URL of the Renku API, e.g. `https://renkulab.io/api`.
    pub api_url: String,
    /// Identifier of the project the dataset comes from.
    pub source_project: String,
    /// Identifier of the project the dataset is imported into.
    pub destination_project: String,
    /// URL of the dataset to import.
    pub source_dataset_url: String,
    /// Seconds between job status polls (default: `6`).
    pub poll_interval_secs: u64,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Required | Default |
    /// |-----------------------|----------|---------|
    /// | `RENKU_API_URL`       | yes      | --      |
    /// | `SOURCE_PROJECT`      | yes      | --      |
    /// | `DESTINATION_PROJECT` | yes      | --      |
    /// | `SOURCE_DATASET_URL`  | yes      | --      |
    /// | `POLL_INTERVAL_SECS`  | no       | `6`     |
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = std::env::var("RENKU_API_URL")
            .context("RENKU_API_URL environment variable is required")?;
        let source_project = std::env::var("SOURCE_PROJECT")
            .context("SOURCE_PROJECT environment variable is required")?;
        let destination_project = std::env::var("DESTINATION_PROJECT")
            .context("DESTINATION_PROJECT environment variable is required")?;
        let source_dataset_url = std::env::var("SOURCE_DATASET_URL")
            .context("SOURCE_DATASET_URL environment variable is required")?;

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(POLL_INTERVAL_SECS);

        Ok(Self {
            api_url,
            source_project,
            destination_project,
            source_dataset_url,
            poll_interval_secs,
        })
    }
}
