//! Shared types, error taxonomy, and collaborator traits for the conversion orchestrator.
//!
//! This crate is the dependency-light foundation every other `bookvoice-*` crate builds on:
//! the data model that flows through the pipeline (`types`), the error kinds shared across
//! stages (`error`), the collaborator traits the orchestrator consumes but never implements
//! (`collaborators`), and a small cooperative cancellation primitive (`cancellation`).

pub mod cancellation;
pub mod collaborators;
pub mod error;
pub mod types;

pub use cancellation::CancellationToken;
pub use collaborators::{
    AudioEncoder, CodecOpts, DictionaryService, FilterChain, KeepAwake, LlmService, ProgressFn,
    TtsSynth,
};
pub use error::{CoreError, ErrorKind};
pub use types::{
    AudioChunk, Character, ContextKey, FileNameEntry, Gender, MergeGroup, PipelineContext,
    PipelineState, SpeakerAssignment, VoiceId, VoiceMap, VoicePool, FEMALE_UNNAMED, MALE_UNNAMED,
    NARRATOR, UNKNOWN_UNNAMED,
};
