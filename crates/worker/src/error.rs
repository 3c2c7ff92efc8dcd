use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to create temp work directory {path}: {source}")]
    TempDirCreate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write chunk file {path}: {source}")]
    ChunkWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
