use async_trait::async_trait;
use bookvoice_core::{ContextKey, VoiceId, VoicePool};

use crate::error::PipelineError;
use crate::step::{PipelineStep, StepDeps};

/// Frequency-based voice remap (§4.3.2), run once real dialogue line counts are known. This
/// is the step immediately before the human voice-review pause.
pub struct RemapVoices;

#[async_trait]
impl PipelineStep for RemapVoices {
    fn name(&self) -> &'static str {
        "remap_voices"
    }

    fn required_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::Characters, ContextKey::VoiceMap, ContextKey::Assignments]
    }

    fn drops_keys(&self) -> &'static [ContextKey] {
        &[]
    }

    async fn execute(
        &self,
        ctx: &mut bookvoice_core::PipelineContext,
        deps: &StepDeps,
    ) -> Result<(), PipelineError> {
        let pool = VoicePool::new(
            deps.settings.voice.male_voices.iter().cloned().map(VoiceId::from).collect(),
            deps.settings.voice.female_voices.iter().cloned().map(VoiceId::from).collect(),
        );
        let narrator_voice = VoiceId::new(deps.settings.voice.narrator_voice.clone());
        let characters = ctx.characters.clone().unwrap_or_default();
        let assignments = ctx.assignments.clone().unwrap_or_default();
        let base_voice_map = ctx.voice_map.clone().unwrap_or_default();

        let voice_map = bookvoice_voice::allocate_by_frequency(
            &base_voice_map,
            &characters,
            &assignments,
            &pool,
            &narrator_voice,
        );
        let remapped = bookvoice_voice::remap_assignments(&assignments, &voice_map, &narrator_voice);

        ctx.voice_map = Some(voice_map);
        ctx.assignments = Some(remapped);
        Ok(())
    }
}
