use thiserror::Error;

/// Failures surfaced by the experiment orchestration core.
///
/// No retries anywhere: a backend failure is reported once and the run ends.
#[derive(Debug, Error)]
pub enum LabError {
    /// `shots` must be a positive integer.
    #[error("shots must be a positive integer")]
    InvalidShots,

    /// A run is already in progress; overlapping runs are rejected rather
    /// than interleaved.
    #[error("a run is already in progress")]
    RunInProgress,

    /// The circuit backend was unreachable, returned a non-2xx status, or
    /// replied with malformed or error-carrying JSON.
    #[error("circuit backend error: {0}")]
    Backend(String),
}
