//! The dataset-import workflow state machine.
//!
//! [`ImportWorkflow`] drives an import strictly in sequence: source
//! compatibility check, destination compatibility check, the
//! metadata-version gate, submission, then fixed-interval status
//! polling. No two backend calls belonging to one workflow are ever in
//! flight concurrently, and a [`CancellationToken`] makes the polling
//! loop cancellable: a response delivered after cancellation is
//! dropped with the future rather than applied.
//!
//! Nothing is retried automatically. Every failure carries a dedicated
//! user-facing message, and the caller restarts from `Idle`.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use renku_core::import::{
    check_version_order, JobState, PollBudget, VersionGateError, POLL_INTERVAL_SECS,
};

use crate::api::{ImportApiError, ImportRequest, JobStatus, ProjectCompatibility, RenkuApi};

// ── Backend seam ─────────────────────────────────────────────────────

/// The three backend calls the workflow needs. [`RenkuApi`] is the
/// production implementation; tests script their own.
#[async_trait::async_trait]
pub trait ImportBackend: Send + Sync {
    async fn project_compatibility(
        &self,
        project_id: &str,
    ) -> Result<ProjectCompatibility, ImportApiError>;

    async fn submit_import(&self, request: &ImportRequest) -> Result<String, ImportApiError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ImportApiError>;
}

#[async_trait::async_trait]
impl ImportBackend for RenkuApi {
    async fn project_compatibility(
        &self,
        project_id: &str,
    ) -> Result<ProjectCompatibility, ImportApiError> {
        RenkuApi::project_compatibility(self, project_id).await
    }

    async fn submit_import(&self, request: &ImportRequest) -> Result<String, ImportApiError> {
        RenkuApi::submit_import(self, request).await
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ImportApiError> {
        RenkuApi::job_status(self, job_id).await
    }
}

// ── States ───────────────────────────────────────────────────────────

/// Where the workflow currently is. Transitions are strictly forward;
/// the only backward edge is reset-to-idle on cancel or restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// No import in progress.
    Idle,
    CheckingSourceCompatibility,
    CheckingDestinationCompatibility,
    ValidatingVersionOrder,
    /// Compatibility confirmed; awaiting the explicit submit action.
    ReadyToImport,
    Submitting,
    Polling,
    /// Terminal: the backend completed the import.
    Completed,
    /// Terminal: the backend reported the job as failed.
    Failed,
    /// Terminal: a client-side fault (validation, transport, timeout).
    Error,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingSourceCompatibility => "checking-source-compatibility",
            Self::CheckingDestinationCompatibility => "checking-destination-compatibility",
            Self::ValidatingVersionOrder => "validating-version-order",
            Self::ReadyToImport => "ready-to-import",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }

    /// `true` when a new import may be started from this state.
    pub fn can_restart(&self) -> bool {
        matches!(self, Self::Idle | Self::Completed | Self::Failed | Self::Error)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Errors ───────────────────────────────────────────────────────────

/// Why an import workflow stopped. Every variant renders as the
/// user-facing message for that failure.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("could not resolve the source project: {0}")]
    SourceCheck(ImportApiError),

    #[error("could not resolve the destination project: {0}")]
    DestinationCheck(ImportApiError),

    #[error(transparent)]
    VersionGate(#[from] VersionGateError),

    #[error("import submission failed: {0}")]
    Submit(ImportApiError),

    #[error("import status check failed: {0}")]
    Poll(ImportApiError),

    /// The backend job reached `FAILED`.
    #[error("import failed: {0}")]
    JobFailed(String),

    /// The polling budget ran out before the job finished.
    #[error("import took too long ({elapsed_secs} s); the job may still finish in the background")]
    TookTooLong { elapsed_secs: u64 },

    #[error("import cancelled")]
    Cancelled,

    /// An operation was invoked from the wrong state, e.g. submitting
    /// while a previous import is still polling.
    #[error("import workflow is busy ({0})")]
    Busy(WorkflowState),
}

// ── Plan, updates, outcome ───────────────────────────────────────────

/// A validated import, ready for submission.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub source: ProjectCompatibility,
    pub destination: ProjectCompatibility,
    /// URL of the dataset being imported.
    pub source_dataset_url: String,
}

impl ImportPlan {
    /// The submission request body for this plan. The import is
    /// written to the destination's default branch at the
    /// destination's metadata version.
    pub fn request(&self) -> ImportRequest {
        ImportRequest {
            source_dataset_url: self.source_dataset_url.clone(),
            destination_git_url: self.destination.git_url.clone(),
            branch: self.destination.default_branch.clone(),
            metadata_version: self.destination.metadata_version,
        }
    }

    /// Where the user lands after a completed import: the destination
    /// project's dataset listing.
    pub fn redirect_target(&self) -> String {
        format!("{}/datasets", self.destination.git_url.trim_end_matches(".git"))
    }
}

/// A user-visible status change observed while polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub state: JobState,
    /// Short status line for display.
    pub text: &'static str,
    /// Cumulative seconds polled so far.
    pub elapsed_secs: u64,
}

/// Result of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub job_id: String,
    /// Location the UI should redirect to, exactly once.
    pub redirect: String,
}

// ── Workflow ─────────────────────────────────────────────────────────

/// Tunable parameters for the workflow.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Delay between job status polls.
    pub poll_interval: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
        }
    }
}

/// Drives one dataset import at a time against an [`ImportBackend`].
pub struct ImportWorkflow<B> {
    backend: B,
    config: WorkflowConfig,
    state: WorkflowState,
}

impl<B: ImportBackend> ImportWorkflow<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, WorkflowConfig::default())
    }

    pub fn with_config(backend: B, config: WorkflowConfig) -> Self {
        Self {
            backend,
            config,
            state: WorkflowState::Idle,
        }
    }

    /// Current workflow state.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Abandon the current import and return to `Idle`.
    pub fn reset(&mut self) {
        self.set_state(WorkflowState::Idle);
    }

    /// Run the compatibility checks and the metadata-version gate,
    /// producing a plan that is ready for submission.
    ///
    /// The source and destination are fetched strictly in sequence.
    /// Only legal from an idle or terminal state: a workflow that is
    /// mid-import rejects the call with [`WorkflowError::Busy`].
    pub async fn prepare(
        &mut self,
        source_project: &str,
        destination_project: &str,
        source_dataset_url: &str,
    ) -> Result<ImportPlan, WorkflowError> {
        if !self.state.can_restart() {
            return Err(WorkflowError::Busy(self.state));
        }

        self.set_state(WorkflowState::CheckingSourceCompatibility);
        let source = match self.backend.project_compatibility(source_project).await {
            Ok(source) => source,
            Err(e) => {
                self.set_state(WorkflowState::Error);
                return Err(WorkflowError::SourceCheck(e));
            }
        };

        self.set_state(WorkflowState::CheckingDestinationCompatibility);
        let destination = match self.backend.project_compatibility(destination_project).await {
            Ok(destination) => destination,
            Err(e) => {
                self.set_state(WorkflowState::Error);
                return Err(WorkflowError::DestinationCheck(e));
            }
        };

        self.set_state(WorkflowState::ValidatingVersionOrder);
        if let Err(e) = check_version_order(source.metadata_version, destination.metadata_version)
        {
            self.set_state(WorkflowState::Error);
            return Err(e.into());
        }

        self.set_state(WorkflowState::ReadyToImport);
        tracing::info!(
            source_version = source.metadata_version,
            destination_version = destination.metadata_version,
            destination = %destination.git_url,
            "projects compatible, ready to import"
        );

        Ok(ImportPlan {
            source,
            destination,
            source_dataset_url: source_dataset_url.to_string(),
        })
    }

    /// Submit the import, returning the backend-assigned job ID.
    ///
    /// Only legal from `ReadyToImport`, which also enforces the
    /// singleton-poll invariant: a second submission while a previous
    /// job is still polling is rejected.
    pub async fn submit(&mut self, plan: &ImportPlan) -> Result<String, WorkflowError> {
        if self.state != WorkflowState::ReadyToImport {
            return Err(WorkflowError::Busy(self.state));
        }

        self.set_state(WorkflowState::Submitting);
        match self.backend.submit_import(&plan.request()).await {
            Ok(job_id) => {
                tracing::info!(%job_id, "import submitted");
                Ok(job_id)
            }
            Err(e) => {
                self.set_state(WorkflowState::Error);
                Err(WorkflowError::Submit(e))
            }
        }
    }

    /// Poll the job until it reaches a terminal state, the polling
    /// budget runs out, a poll fails, or `cancel` is triggered.
    ///
    /// `on_status` is invoked once per observed state change with the
    /// user-facing status text. On completion the returned outcome
    /// carries the single redirect target.
    pub async fn poll(
        &mut self,
        job_id: &str,
        plan: &ImportPlan,
        cancel: &CancellationToken,
        mut on_status: impl FnMut(StatusUpdate),
    ) -> Result<ImportOutcome, WorkflowError> {
        if self.state != WorkflowState::Submitting {
            return Err(WorkflowError::Busy(self.state));
        }
        self.set_state(WorkflowState::Polling);

        let mut budget = PollBudget::new(self.config.poll_interval.as_secs());
        let mut interval = tokio::time::interval(self.config.poll_interval);
        let mut last_state: Option<JobState> = None;

        loop {
            // Wait for the next tick, bailing out promptly on cancel.
            let ticked = tokio::select! {
                _ = cancel.cancelled() => false,
                _ = interval.tick() => true,
            };
            if !ticked {
                return Err(self.cancelled(job_id));
            }

            // A cancellation mid-request drops the in-flight future,
            // so a late response is never applied.
            let fetched = tokio::select! {
                _ = cancel.cancelled() => None,
                result = self.backend.job_status(job_id) => Some(result),
            };
            let status = match fetched {
                None => return Err(self.cancelled(job_id)),
                Some(Ok(status)) => status,
                Some(Err(e)) => {
                    self.set_state(WorkflowState::Error);
                    return Err(WorkflowError::Poll(e));
                }
            };

            budget.tick();

            if last_state != Some(status.state) {
                tracing::info!(
                    %job_id,
                    status = status.state.status_text(),
                    elapsed_secs = budget.elapsed_secs(),
                    "import status changed"
                );
                on_status(StatusUpdate {
                    state: status.state,
                    text: status.state.status_text(),
                    elapsed_secs: budget.elapsed_secs(),
                });
                last_state = Some(status.state);
            }

            match status.state {
                JobState::Completed => {
                    self.set_state(WorkflowState::Completed);
                    return Ok(ImportOutcome {
                        job_id: job_id.to_string(),
                        redirect: plan.redirect_target(),
                    });
                }
                JobState::Failed => {
                    let message = status
                        .error()
                        .unwrap_or("the backend reported no failure detail")
                        .to_string();
                    self.set_state(WorkflowState::Failed);
                    return Err(WorkflowError::JobFailed(message));
                }
                JobState::Enqueued | JobState::InProgress | JobState::Unknown => {}
            }

            if budget.exceeded(status.state) {
                self.set_state(WorkflowState::Error);
                return Err(WorkflowError::TookTooLong {
                    elapsed_secs: budget.elapsed_secs(),
                });
            }
        }
    }

    /// Run an import end to end: prepare, submit, poll.
    pub async fn run(
        &mut self,
        source_project: &str,
        destination_project: &str,
        source_dataset_url: &str,
        cancel: &CancellationToken,
        on_status: impl FnMut(StatusUpdate),
    ) -> Result<ImportOutcome, WorkflowError> {
        let plan = self
            .prepare(source_project, destination_project, source_dataset_url)
            .await?;
        let job_id = self.submit(&plan).await?;
        self.poll(&job_id, &plan, cancel, on_status).await
    }

    // ---- private helpers ----

    fn set_state(&mut self, next: WorkflowState) {
        tracing::debug!(from = %self.state, to = %next, "import workflow transition");
        self.state = next;
    }

    fn cancelled(&mut self, job_id: &str) -> WorkflowError {
        tracing::info!(%job_id, "import polling cancelled");
        self.set_state(WorkflowState::Idle);
        WorkflowError::Cancelled
    }
}
