//! REST API client for the dataset-import endpoints.
//!
//! Wraps the three HTTP calls the import workflow needs — project
//! compatibility lookup, import submission, and job status — using
//! [`reqwest`]. Backend-reported failures (the `{"error": {...}}`
//! envelope) are surfaced with their `userMessage`/`reason` text
//! verbatim so the UI can show the backend's own explanation.

use renku_core::import::{parse_metadata_version, JobState};
use serde::{Deserialize, Serialize};

/// HTTP client for one Renku deployment.
pub struct RenkuApi {
    client: reqwest::Client,
    base_url: String,
}

// ── Wire types ───────────────────────────────────────────────────────

/// Compatibility descriptor for a project, as returned by the
/// migration-status endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCompatibility {
    /// Metadata schema version. The backend emits this as either a
    /// JSON number or a string; both are accepted.
    #[serde(deserialize_with = "deserialize_metadata_version")]
    pub metadata_version: u32,
    /// HTTPS git URL of the project repository.
    pub git_url: String,
    /// Branch imports are written to.
    pub default_branch: String,
}

/// Body of the import submission request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub source_dataset_url: String,
    pub destination_git_url: String,
    pub branch: String,
    pub metadata_version: u32,
}

/// Response to a successful import submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Opaque backend-assigned job identifier.
    pub job_id: String,
}

/// Status of an import job as reported by the job queue.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    /// The job state, with unrecognized wire values mapped to
    /// [`JobState::Unknown`].
    #[serde(deserialize_with = "deserialize_job_state")]
    pub state: JobState,
    #[serde(default)]
    extras: Option<JobExtras>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct JobExtras {
    #[serde(default)]
    error: Option<String>,
}

impl JobStatus {
    /// Build a status value directly (the workflow's backend seam is a
    /// trait, so alternative backends need a constructor).
    pub fn new(state: JobState, error: Option<String>) -> Self {
        Self {
            state,
            extras: error.map(|error| JobExtras { error: Some(error) }),
        }
    }

    /// Backend-reported failure detail, if any.
    pub fn error(&self) -> Option<&str> {
        self.extras.as_ref().and_then(|e| e.error.as_deref())
    }
}

fn deserialize_job_state<'de, D>(deserializer: D) -> Result<JobState, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let wire = String::deserialize(deserializer)?;
    Ok(JobState::from_wire(&wire))
}

/// The `{"error": {...}}` payload the backend uses for
/// application-level failures, which may arrive with a 2xx status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendError {
    pub reason: String,
    #[serde(default)]
    pub user_message: Option<String>,
}

impl BackendError {
    /// Text to show the user: the backend's `userMessage` when
    /// present, otherwise its `reason`.
    pub fn user_text(&self) -> &str {
        self.user_message.as_deref().unwrap_or(&self.reason)
    }
}

/// A response body that is either the expected payload or the error
/// envelope. The error arm is listed first so a body carrying `error`
/// can never be misread as a payload with missing optional fields.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Err { error: BackendError },
    Ok(T),
}

// ── Errors ───────────────────────────────────────────────────────────

/// Errors from the import REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ImportApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("backend error ({status}): {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend reported an application-level failure in its error
    /// envelope.
    #[error("{}", .0.user_text())]
    Backend(BackendError),
}

// ── Client ───────────────────────────────────────────────────────────

impl RenkuApi {
    /// Create a new API client for a Renku deployment.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `https://renkulab.io/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across services).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Base HTTP URL of the deployment.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a project's compatibility descriptor (metadata version,
    /// git URL, default branch).
    ///
    /// Sends `GET /projects/{id}/migration-status`.
    pub async fn project_compatibility(
        &self,
        project_id: &str,
    ) -> Result<ProjectCompatibility, ImportApiError> {
        let response = self
            .client
            .get(format!(
                "{}/projects/{}/migration-status",
                self.base_url, project_id
            ))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit a dataset import, returning the backend-assigned job ID.
    ///
    /// Sends `POST /datasets/import`.
    pub async fn submit_import(&self, request: &ImportRequest) -> Result<String, ImportApiError> {
        let response = self
            .client
            .post(format!("{}/datasets/import", self.base_url))
            .json(request)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        Ok(submitted.job_id)
    }

    /// Fetch the current status of an import job.
    ///
    /// Sends `GET /jobs/{job_id}`.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatus, ImportApiError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.base_url, job_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ImportApiError::Http`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ImportApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ImportApiError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful response body, unwrapping the backend's
    /// error envelope if present.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ImportApiError> {
        let response = Self::ensure_success(response).await?;
        match response.json::<Envelope<T>>().await? {
            Envelope::Ok(value) => Ok(value),
            Envelope::Err { error } => Err(ImportApiError::Backend(error)),
        }
    }
}

// ── Metadata version deserialisation ─────────────────────────────────

/// Accept a metadata version as either a JSON number or a string.
fn deserialize_metadata_version<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("metadata version out of range: {n}"))),
        serde_json::Value::String(s) => parse_metadata_version(&s).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "metadata version must be a number or string, got {other}"
        ))),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
