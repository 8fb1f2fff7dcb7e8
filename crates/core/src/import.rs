//! Pure dataset-import job model: backend job states, user-facing
//! status text, the metadata-version gate, and the client-side polling
//! budget.
//!
//! Everything here is synchronous and I/O-free; the HTTP client and
//! the polling loop that consume these types live in `renku-import`.

use serde::{Deserialize, Serialize};

// ── Polling constants ────────────────────────────────────────────────

/// Seconds between job status polls.
pub const POLL_INTERVAL_SECS: u64 = 6;

/// Budget for a job to leave the queue: if it has not reached
/// `IN_PROGRESS` within this many seconds, polling gives up.
pub const ENQUEUED_TIMEOUT_SECS: u64 = 180;

/// Budget for the whole job: if it has not reached a terminal state
/// within this many seconds of cumulative polling, polling gives up.
pub const TOTAL_TIMEOUT_SECS: u64 = 360;

// ── Job states ───────────────────────────────────────────────────────

/// State of an import job as reported by the backend job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Enqueued,
    InProgress,
    Completed,
    Failed,
    /// The backend reported a state this client does not recognize.
    Unknown,
}

impl JobState {
    /// Map a backend wire value to a job state. Unrecognized values
    /// become [`JobState::Unknown`] rather than an error, so a newer
    /// backend cannot break the client.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "ENQUEUED" => Self::Enqueued,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// `true` when no further state transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Short user-facing status line for this state.
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Enqueued => "Queued for import",
            Self::InProgress => "Import in progress",
            Self::Completed => "Import completed",
            Self::Failed => "Import failed",
            Self::Unknown => "Import status unknown",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status_text())
    }
}

// ── Metadata-version gate ────────────────────────────────────────────

/// Why a source/destination pair failed the metadata-version gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionGateError {
    /// The destination project's metadata schema is older than the
    /// source's: importing would write records the destination cannot
    /// represent.
    #[error(
        "destination project metadata version ({destination_version}) is older than \
         the source project's ({source_version}); migrate the destination project first"
    )]
    DestinationTooOld {
        source_version: u32,
        destination_version: u32,
    },

    /// A version tag could not be read as a number.
    #[error("unrecognized metadata version {value:?}")]
    Unparsable { value: String },
}

/// Parse a metadata-version tag. The backend emits these as either a
/// JSON number or a string like `"9"`.
pub fn parse_metadata_version(value: &str) -> Result<u32, VersionGateError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| VersionGateError::Unparsable {
            value: value.to_string(),
        })
}

/// Enforce the import compatibility invariant: the destination's
/// metadata version must be greater than or equal to the source's.
pub fn check_version_order(source: u32, destination: u32) -> Result<(), VersionGateError> {
    if destination >= source {
        Ok(())
    } else {
        Err(VersionGateError::DestinationTooOld {
            source_version: source,
            destination_version: destination,
        })
    }
}

// ── Polling budget ───────────────────────────────────────────────────

/// Client-tracked wall-clock budget for the polling loop.
///
/// Elapsed time is accumulated per tick rather than measured, matching
/// what the user has actually been waiting through: one interval per
/// completed poll.
#[derive(Debug, Clone)]
pub struct PollBudget {
    elapsed_secs: u64,
    interval_secs: u64,
}

impl PollBudget {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            elapsed_secs: 0,
            interval_secs,
        }
    }

    /// Record one completed poll interval.
    pub fn tick(&mut self) {
        self.elapsed_secs += self.interval_secs;
    }

    /// Cumulative seconds spent polling so far.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// `true` once the budget for the job's current state is spent:
    /// 180 s for a job still queued, 360 s overall for a running job.
    /// Terminal states never exceed the budget.
    pub fn exceeded(&self, state: JobState) -> bool {
        match state {
            JobState::Enqueued | JobState::Unknown => self.elapsed_secs >= ENQUEUED_TIMEOUT_SECS,
            JobState::InProgress => self.elapsed_secs >= TOTAL_TIMEOUT_SECS,
            JobState::Completed | JobState::Failed => false,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
