//! Step-based conversion pipeline: shared context, resume support, and run orchestration.

pub mod error;
pub mod orchestrator;
pub mod resume;
pub mod runner;
pub mod step;
pub mod steps;
pub mod text;

#[cfg(test)]
pub mod test_support;

pub use error::PipelineError;
pub use orchestrator::{AlwaysResume, Orchestrator, OrchestratorEvent, ResumeConfirmation};
pub use resume::{ResumeInfo, ResumeManager};
pub use runner::{PauseHandler, PipelineRunner};
pub use step::{PipelineStep, StepDeps};
pub use steps::{
    ApplyDictionary, AssignSpeakers, AssignVoicesInitial, AudioMerge, Cleanup, ExtractCharacters,
    RemapVoices, Sanitize, TtsConvert,
};
