use async_trait::async_trait;
use bookvoice_core::{ContextKey, CoreError};

use crate::error::PipelineError;
use crate::step::{PipelineStep, StepDeps};
use crate::text::is_pronounceable;

/// Drops assignments whose text has no pronounceable content, so the worker pool never
/// dispatches a TTS call that would produce nothing. Fails the run if nothing survives.
pub struct Sanitize;

#[async_trait]
impl PipelineStep for Sanitize {
    fn name(&self) -> &'static str {
        "sanitize"
    }

    fn required_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::Assignments]
    }

    fn drops_keys(&self) -> &'static [ContextKey] {
        &[]
    }

    async fn execute(
        &self,
        ctx: &mut bookvoice_core::PipelineContext,
        _deps: &StepDeps,
    ) -> Result<(), PipelineError> {
        let assignments = ctx.assignments.take().unwrap_or_default();
        let sanitized: Vec<_> = assignments
            .into_iter()
            .filter(|a| is_pronounceable(&a.text))
            .collect();

        if sanitized.is_empty() {
            return Err(PipelineError::Core(CoreError::NoPronounceableContent));
        }

        ctx.assignments = Some(sanitized);
        Ok(())
    }
}
