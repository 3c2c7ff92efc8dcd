use async_trait::async_trait;
use bookvoice_core::{ContextKey, CoreError, PipelineState};
use tracing::warn;

use crate::error::PipelineError;
use crate::resume::ResumeManager;
use crate::step::{PipelineStep, ProgressEvent, StepDeps};
use crate::text::text_blocks;

/// Runs the LLM speaker-assignment pass: one `SpeakerAssignment` per sentence. Only ever
/// installed when an LLM is configured — the orchestrator builds narrator-only assignments
/// directly when it isn't.
pub struct AssignSpeakers;

#[async_trait]
impl PipelineStep for AssignSpeakers {
    fn name(&self) -> &'static str {
        "assign_speakers"
    }

    fn required_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::Characters, ContextKey::VoiceMap]
    }

    fn drops_keys(&self) -> &'static [ContextKey] {
        &[]
    }

    async fn execute(
        &self,
        ctx: &mut bookvoice_core::PipelineContext,
        deps: &StepDeps,
    ) -> Result<(), PipelineError> {
        let llm = deps.llm.as_ref().ok_or_else(|| {
            PipelineError::Core(CoreError::Fatal(
                "assign_speakers step requires an LlmService".to_string(),
            ))
        })?;

        let blocks = text_blocks(&ctx.text);
        let characters = ctx.characters.clone().unwrap_or_default();
        let voice_map = ctx.voice_map.clone().unwrap_or_default();

        let status = deps.on_status.clone();
        let on_progress: Option<bookvoice_core::collaborators::ProgressFn> = status.map(|sink| {
            let f: bookvoice_core::collaborators::ProgressFn = Box::new(move |done, total| {
                sink(ProgressEvent {
                    step_name: "assign_speakers",
                    current: done as u64,
                    total: total as u64,
                    message: format!("assigning speakers {done}/{total}"),
                });
            });
            f
        });

        let assignments = llm
            .assign_speakers(&blocks, &voice_map, &characters, on_progress)
            .await?;

        let state = PipelineState {
            assignments: assignments.clone(),
            character_voice_map: voice_map
                .iter()
                .map(|(name, voice)| (name.clone(), voice.as_str().to_string()))
                .collect(),
            characters,
            file_names: ctx.file_names.clone(),
        };
        if let Err(source) = ResumeManager::save_state(&deps.output_dir, &state).await {
            warn!(%source, "failed to write resume state after speaker assignment");
        }

        ctx.assignments = Some(assignments);
        Ok(())
    }
}
