//! Groups synthesized audio chunks into target-duration output files (§4.4).

pub mod error;
pub mod planner;
pub mod run;

pub use error::MergeError;
pub use planner::{plan_groups, ChunkInfo};
pub use run::{load_chunk_durations, load_chunks_from_disk, run_merge};
