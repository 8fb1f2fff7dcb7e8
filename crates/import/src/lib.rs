//! Asynchronous dataset-import client for the Renku platform.
//!
//! [`api::RenkuApi`] wraps the three HTTP endpoints the import needs
//! (project compatibility check, import submission, job status), and
//! [`workflow::ImportWorkflow`] drives them as a sequential,
//! cancellable state machine: compatibility checks, the
//! metadata-version gate, submission, and fixed-interval status
//! polling with a wall-clock budget.

pub mod api;
pub mod workflow;

pub use api::{
    BackendError, ImportApiError, ImportRequest, JobStatus, ProjectCompatibility, RenkuApi,
    SubmitResponse,
};
pub use workflow::{
    ImportBackend, ImportOutcome, ImportPlan, ImportWorkflow, StatusUpdate, WorkflowConfig,
    WorkflowError, WorkflowState,
};
