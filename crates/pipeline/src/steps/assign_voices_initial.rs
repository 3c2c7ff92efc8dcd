use async_trait::async_trait;
use bookvoice_core::{ContextKey, VoiceId, VoicePool};

use crate::error::PipelineError;
use crate::step::{PipelineStep, StepDeps};

/// Gender-based initial voice assignment (§4.3.1), run before any dialogue has been
/// attributed to a speaker.
pub struct AssignVoicesInitial;

#[async_trait]
impl PipelineStep for AssignVoicesInitial {
    fn name(&self) -> &'static str {
        "assign_voices_initial"
    }

    fn required_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::Characters]
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
        let characters = ctx.characters.as_deref().unwrap_or_default();

        let voice_map = bookvoice_voice::allocate_by_gender(characters, &pool, &narrator_voice);
        ctx.voice_map = Some(voice_map);
        Ok(())
    }
}
