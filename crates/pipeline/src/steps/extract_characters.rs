use async_trait::async_trait;
use bookvoice_core::{ContextKey, CoreError};

use crate::error::PipelineError;
use crate::step::{PipelineStep, ProgressEvent, StepDeps};
use crate::text::text_blocks;

/// Runs the LLM character-extraction pass over the chapter text. Only ever installed when an
/// LLM is configured.
pub struct ExtractCharacters;

#[async_trait]
impl PipelineStep for ExtractCharacters {
    fn name(&self) -> &'static str {
        "extract_characters"
    }

    fn required_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::Text]
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
                "extract_characters step requires an LlmService".to_string(),
            ))
        })?;

        let blocks = text_blocks(&ctx.text);
        let status = deps.on_status.clone();
        let on_progress: Option<bookvoice_core::collaborators::ProgressFn> = status.map(|sink| {
            let f: bookvoice_core::collaborators::ProgressFn = Box::new(move |done, total| {
                sink(ProgressEvent {
                    step_name: "extract_characters",
                    current: done as u64,
                    total: total as u64,
                    message: format!("extracting characters {done}/{total}"),
                });
            });
            f
        });

        let characters = llm.extract_characters(&blocks, on_progress).await?;
        ctx.characters = Some(characters);
        Ok(())
    }
}
