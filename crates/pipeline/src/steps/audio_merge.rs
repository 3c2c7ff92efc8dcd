use async_trait::async_trait;
use bookvoice_config::OutputFormat;
use bookvoice_core::{CodecOpts, ContextKey, FilterChain};
use tracing::warn;

use crate::error::PipelineError;
use crate::step::{PipelineStep, StepDeps};

/// Groups synthesized chunks into target-duration output files (§4.4).
pub struct AudioMerge;

#[async_trait]
impl PipelineStep for AudioMerge {
    fn name(&self) -> &'static str {
        "audio_merge"
    }

    fn required_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::AudioMap]
    }

    fn drops_keys(&self) -> &'static [ContextKey] {
        &[ContextKey::AudioMap]
    }

    async fn execute(
        &self,
        ctx: &mut bookvoice_core::PipelineContext,
        deps: &StepDeps,
    ) -> Result<(), PipelineError> {
        if let Some(failed) = ctx.failed_tasks.as_ref().filter(|f| !f.is_empty()) {
            warn!(
                failed_count = failed.len(),
                part_indexes = ?failed,
                "some TTS tasks exhausted retries; merging the parts that did synthesize"
            );
            if let Some(on_error) = &deps.on_error {
                on_error(
                    format!(
                        "{} of the book's sentences failed to synthesize after retries; \
                         continuing with the rest",
                        failed.len()
                    ),
                    "partial_synthesis_failure".to_string(),
                );
            }
        }

        let audio_map = ctx.audio_map.clone().unwrap_or_default();
        let temp_dir = bookvoice_worker::temp_dir_handle(&deps.output_dir).await?;
        let part_indexes: Vec<u32> = audio_map.keys().copied().collect();
        let chunk_bytes = bookvoice_merge::load_chunks_from_disk(&temp_dir, part_indexes).await?;

        let merge = &deps.settings.merge;
        let filter_chain = FilterChain {
            eq: merge.eq,
            de_ess: merge.de_ess,
            silence_removal: merge.silence_removal,
            compressor: merge.compressor,
            normalization: merge.normalization,
            fade_in: merge.fade_in,
            stereo_width: merge.stereo_width,
        };
        let codec_opts = match merge.output_format {
            OutputFormat::Opus => CodecOpts::Opus {
                min_bitrate: merge.opus_min_bitrate,
                max_bitrate: merge.opus_max_bitrate,
                compression_level: merge.opus_compression_level,
            },
            OutputFormat::Mp3 => CodecOpts::Mp3 {
                bitrate: merge.opus_max_bitrate,
                vbr: true,
            },
        };

        let saved = bookvoice_merge::run_merge(
            &chunk_bytes,
            &ctx.file_names,
            merge.target_duration_ms,
            merge.silence_gap_ms,
            filter_chain,
            &codec_opts,
            &deps.output_dir,
            deps.encoder.clone(),
        )
        .await?;

        ctx.saved_file_count = Some(saved);
        Ok(())
    }
}
