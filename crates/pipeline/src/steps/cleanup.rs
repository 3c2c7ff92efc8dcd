use async_trait::async_trait;
use bookvoice_core::ContextKey;
use tracing::warn;

use crate::error::PipelineError;
use crate::step::{PipelineStep, StepDeps};

/// Removes `_temp_work/` and the now-unneeded transient context fields once the merge has
/// produced final output files.
pub struct Cleanup;

#[async_trait]
impl PipelineStep for Cleanup {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn required_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::SavedFileCount]
    }

    fn drops_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::FailedTasks, ContextKey::TempDirHandle]
    }

    async fn execute(
        &self,
        _ctx: &mut bookvoice_core::PipelineContext,
        deps: &StepDeps,
    ) -> Result<(), PipelineError> {
        let temp_dir = deps.output_dir.join("_temp_work");
        if let Err(source) = tokio::fs::remove_dir_all(&temp_dir).await {
            if source.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %temp_dir.display(), %source, "failed to remove temp work directory");
            }
        }
        Ok(())
    }
}
