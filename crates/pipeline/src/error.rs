use thiserror::Error;

use bookvoice_core::{ContextKey, CoreError};
use bookvoice_merge::MergeError;
use bookvoice_worker::WorkerError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("step `{step}` requires context key `{key:?}` which is not yet present")]
    MissingPrecondition { step: String, key: ContextKey },

    #[error("conversion cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize pipeline state at {path}: {source}")]
    State {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, PipelineError::Core(e) if e.is_retriable())
    }
}
