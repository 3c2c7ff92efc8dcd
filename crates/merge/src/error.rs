use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to read chunk file {path}: {source}")]
    ChunkRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("chunk {part_index} is not valid MPEG audio")]
    UnparseableChunk { part_index: u32 },

    #[error("failed to write output file {path}: {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder collaborator failed: {0}")]
    Encoder(#[from] bookvoice_core::CoreError),
}
