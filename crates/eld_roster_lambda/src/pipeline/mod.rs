pub mod batch;
pub mod retry;

use crate::adapters::object_store::StoreError;
use crate::runtime::contract::ValidationError;

use self::retry::RetryError;

/// Fatal failure of an aggregation run. Per-company fetch failures never
/// surface here; they are absorbed into the batch results.
#[derive(Debug)]
pub enum PipelineError {
    /// A top-level stage exhausted its retry budget.
    Retry(RetryError),
    Validation(ValidationError),
    Store(StoreError),
    /// The wall-clock budget elapsed; the last completed checkpoint remains.
    Timeout { budget_secs: u64 },
    Internal(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retry(error) => error.fmt(f),
            Self::Validation(error) => error.fmt(f),
            Self::Store(error) => error.fmt(f),
            Self::Timeout { budget_secs } => {
                write!(f, "pipeline timed out after {budget_secs} seconds")
            }
            Self::Internal(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<RetryError> for PipelineError {
    fn from(error: RetryError) -> Self {
        Self::Retry(error)
    }
}

impl From<ValidationError> for PipelineError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error)
    }
}

impl From<StoreError> for PipelineError {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}
