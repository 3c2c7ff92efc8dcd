use async_trait::async_trait;
use bookvoice_core::ContextKey;

use crate::error::PipelineError;
use crate::step::{PipelineStep, StepDeps};

/// Applies pronunciation-dictionary rules to every assignment's text, via the
/// `DictionaryService` collaborator. A no-op when no dictionary is configured.
pub struct ApplyDictionary;

#[async_trait]
impl PipelineStep for ApplyDictionary {
    fn name(&self) -> &'static str {
        "apply_dictionary"
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
        deps: &StepDeps,
    ) -> Result<(), PipelineError> {
        let Some(dictionary) = &deps.dictionary else {
            return Ok(());
        };

        let mut assignments = ctx.assignments.take().unwrap_or_default();
        for assignment in &mut assignments {
            assignment.text = dictionary.apply(&assignment.text).await?;
        }
        ctx.assignments = Some(assignments);
        Ok(())
    }
}
