//! Bounded-concurrency TTS synthesis scheduling with retry and cooperative cancellation (§4.2).

pub mod backoff;
pub mod error;
pub mod pool;

pub use error::WorkerError;
pub use pool::{
    filter_already_synthesized, run_pool, temp_dir_handle, PoolCallbacks, PoolConfig, PoolOutcome,
    RetryPolicy, SynthesisTask,
};
