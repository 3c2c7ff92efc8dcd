use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bookvoice_config::Settings;
use bookvoice_core::{
    AudioEncoder, CancellationToken, ContextKey, DictionaryService, LlmService, PipelineContext, TtsSynth,
};

use crate::error::PipelineError;

/// One progress tick a step reports through `StepDeps::report`, carrying the fields a caller
/// needs to render a real progress bar rather than parse a free-text string.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub step_name: &'static str,
    pub current: u64,
    pub total: u64,
    pub message: String,
}

pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Collaborators and run-scoped configuration every step may need. `settings` is an owned
/// clone taken once at orchestrator entry — the "input snapshot" — so a step never observes
/// a config value changing mid-run even if the caller's own `Settings` handle is mutated
/// concurrently.
#[derive(Clone)]
pub struct StepDeps {
    /// `None` when no LLM is configured; the orchestrator then skips every step that would
    /// need it (`ExtractCharacters`, `AssignVoicesInitial`, `AssignSpeakers`, `RemapVoices`).
    pub llm: Option<Arc<dyn LlmService>>,
    pub tts: Arc<dyn TtsSynth>,
    pub encoder: Arc<dyn AudioEncoder>,
    pub dictionary: Option<Arc<dyn DictionaryService>>,
    pub settings: Settings,
    pub output_dir: PathBuf,
    pub cancellation: CancellationToken,
    pub on_status: Option<ProgressSink>,
    pub on_task_complete: Option<Arc<dyn Fn(u32, String) + Send + Sync>>,
    pub on_task_error: Option<Arc<dyn Fn(u32, String) + Send + Sync>>,
    /// A step-level failure worth surfacing to the caller without aborting the run (e.g. a
    /// partial synthesis failure the merge proceeds through anyway). `(message, code)`.
    pub on_error: Option<Arc<dyn Fn(String, String) + Send + Sync>>,
}

impl StepDeps {
    pub fn report(&self, step_name: &'static str, current: u64, total: u64, message: impl Into<String>) {
        if let Some(sink) = &self.on_status {
            sink(ProgressEvent {
                step_name,
                current,
                total,
                message: message.into(),
            });
        }
    }
}

/// One stage of the conversion pipeline. `required_keys`/`drops_keys` are the declared
/// pre/postconditions the runner enforces mechanically, rather than each step having to
/// remember to validate or clean up its own context fields.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    fn name(&self) -> &'static str;
    fn required_keys(&self) -> &'static [ContextKey];
    fn drops_keys(&self) -> &'static [ContextKey];
    async fn execute(&self, ctx: &mut PipelineContext, deps: &StepDeps) -> Result<(), PipelineError>;
}
