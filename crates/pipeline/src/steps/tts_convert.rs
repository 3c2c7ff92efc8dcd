use async_trait::async_trait;
use bookvoice_core::ContextKey;
use bookvoice_worker::{PoolCallbacks, PoolConfig, RetryPolicy, SynthesisTask};

use crate::error::PipelineError;
use crate::step::{PipelineStep, ProgressEvent, StepDeps};

fn chapter_for(sentence_index: u32, file_names: &[(String, u32)]) -> String {
    file_names
        .iter()
        .filter(|(_, start)| *start <= sentence_index)
        .max_by_key(|(_, start)| *start)
        .or_else(|| file_names.first())
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "Chapter 1".to_string())
}

/// Dispatches every surviving assignment to the TTS worker pool, producing one chunk file
/// per sentence under `_temp_work/`.
pub struct TtsConvert;

#[async_trait]
impl PipelineStep for TtsConvert {
    fn name(&self) -> &'static str {
        "tts_convert"
    }

    fn required_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::Assignments]
    }

    fn drops_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::Assignments]
    }

    async fn execute(
        &self,
        ctx: &mut bookvoice_core::PipelineContext,
        deps: &StepDeps,
    ) -> Result<(), PipelineError> {
        let assignments = ctx.assignments.clone().unwrap_or_default();
        let tasks: Vec<SynthesisTask> = assignments
            .iter()
            .map(|a| SynthesisTask {
                part_index: a.sentence_index,
                text: a.text.clone(),
                filename: chapter_for(a.sentence_index, &ctx.file_names),
                filenum: format!("{:06}", a.sentence_index),
                voice: a.voice_id.clone(),
            })
            .collect();

        let pool_config = PoolConfig {
            max_workers: deps.settings.worker.max_workers,
            output_directory: deps.output_dir.clone(),
            retry: RetryPolicy {
                base_delay_ms: deps.settings.worker.retry.base_delay_ms,
                max_delay_ms: deps.settings.worker.retry.max_delay_ms,
                max_attempts: deps.settings.worker.retry.max_attempts,
            },
        };
        let on_status = deps.on_status.clone();
        let callbacks = PoolCallbacks {
            on_status: on_status.map(|sink| {
                let f: std::sync::Arc<dyn Fn(u64, u64, String) + Send + Sync> =
                    std::sync::Arc::new(move |current, total, message| {
                        sink(ProgressEvent {
                            step_name: "tts_convert",
                            current,
                            total,
                            message,
                        });
                    });
                f
            }),
            on_task_complete: deps.on_task_complete.clone(),
            on_task_error: deps.on_task_error.clone(),
        };

        let outcome = bookvoice_worker::run_pool(
            tasks,
            pool_config,
            deps.tts.clone(),
            deps.cancellation.clone(),
            callbacks,
        )
        .await?;

        let audio_map = outcome.completed.into_iter().collect();
        ctx.audio_map = Some(audio_map);
        ctx.failed_tasks = Some(outcome.failed_tasks);
        Ok(())
    }
}
