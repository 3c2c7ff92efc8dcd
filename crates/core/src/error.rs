//! The error taxonomy shared by every stage of the conversion pipeline.

use thiserror::Error;

/// The kind of failure, independent of which component raised it. Mirrors the taxonomy
/// every stage-specific error type (`PipelineError`, `WorkerError`, ...) converts into at
/// the orchestrator boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// User-initiated; propagates silently to the caller as a cancellation notice.
    Cancelled,
    /// A step's required context key was missing.
    PreconditionFailed,
    /// Network, 5xx, rate limiting, transient WebSocket close — recovered by local retry.
    Transient,
    /// Authentication, malformed request, encoder failure, permission denied after retry.
    Fatal,
    /// Some TTS tasks exhausted retries but others succeeded; the merge proceeds regardless.
    PartialSynthesisFailure,
    /// Input contained no alphanumeric characters.
    NoPronounceableContent,
    /// The configured container requires an external encoder binary that could not be found.
    MissingFfmpeg,
}

impl ErrorKind {
    /// Whether an error of this kind should be retried by the component that produced it.
    /// Only `Transient` is; every other kind is terminal to the step or run.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

/// The orchestrator-facing error every stage-specific error converts into.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("conversion cancelled")]
    Cancelled,

    #[error("precondition failed: missing required context key `{0}`")]
    PreconditionFailed(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("fatal failure: {0}")]
    Fatal(String),

    #[error("{failed} of {attempted} synthesis tasks failed: {part_indexes:?}")]
    PartialSynthesisFailure {
        failed: usize,
        attempted: usize,
        part_indexes: Vec<u32>,
    },

    #[error("input contained no pronounceable content")]
    NoPronounceableContent,

    #[error("audio encoder unavailable: ffmpeg is required for the `{0}` output format")]
    MissingFfmpeg(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Cancelled => ErrorKind::Cancelled,
            CoreError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            CoreError::Transient(_) => ErrorKind::Transient,
            CoreError::Fatal(_) => ErrorKind::Fatal,
            CoreError::PartialSynthesisFailure { .. } => ErrorKind::PartialSynthesisFailure,
            CoreError::NoPronounceableContent => ErrorKind::NoPronounceableContent,
            CoreError::MissingFfmpeg(_) => ErrorKind::MissingFfmpeg,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.kind().is_retriable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retriable() {
        assert!(CoreError::Transient("503".into()).is_retriable());
        assert!(!CoreError::Fatal("bad auth".into()).is_retriable());
        assert!(!CoreError::Cancelled.is_retriable());
    }
}
