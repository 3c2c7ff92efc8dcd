//! Mock collaborators and a ready-to-use `StepDeps` for step-level unit tests.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bookvoice_config::Settings;
use bookvoice_core::{
    AudioEncoder, CancellationToken, Character, CodecOpts, CoreError, FilterChain, KeepAwake,
    LlmService, SpeakerAssignment, TtsSynth, VoiceMap,
};

use crate::step::StepDeps;

pub struct NoopLlm;

#[async_trait]
impl LlmService for NoopLlm {
    async fn extract_characters(
        &self,
        _text_blocks: &[String],
        _on_progress: Option<bookvoice_core::collaborators::ProgressFn>,
    ) -> Result<Vec<Character>, CoreError> {
        Ok(Vec::new())
    }

    async fn assign_speakers(
        &self,
        _text_blocks: &[String],
        _voice_map: &VoiceMap,
        _characters: &[Character],
        _on_progress: Option<bookvoice_core::collaborators::ProgressFn>,
    ) -> Result<Vec<SpeakerAssignment>, CoreError> {
        Ok(Vec::new())
    }
}

pub struct EchoTts;

#[async_trait]
impl TtsSynth for EchoTts {
    async fn synthesize(
        &self,
        text: &str,
        _voice: &str,
        _rate: f32,
        _pitch: f32,
        _volume: f32,
    ) -> Result<Vec<u8>, CoreError> {
        Ok(text.as_bytes().to_vec())
    }
}

pub struct NoopKeepAwake;

#[async_trait]
impl KeepAwake for NoopKeepAwake {
    async fn acquire(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn release(&self) {}
}

pub struct ConcatEncoder;

#[async_trait]
impl AudioEncoder for ConcatEncoder {
    async fn concat_and_filter(
        &self,
        input_bytes: &[Vec<u8>],
        _inter_gap_ms: u32,
        _filter_chain: FilterChain,
        _codec_opts: &CodecOpts,
    ) -> Result<Vec<u8>, CoreError> {
        Ok(input_bytes.concat())
    }
}

/// A `StepDeps` with inert mock collaborators, default settings, and no callbacks —
/// good enough for any step whose test does not care about the collaborator's behavior.
pub fn fake_deps() -> StepDeps {
    fake_deps_at(std::env::temp_dir())
}

pub fn fake_deps_at(output_dir: PathBuf) -> StepDeps {
    StepDeps {
        llm: Some(Arc::new(NoopLlm)),
        tts: Arc::new(EchoTts),
        encoder: Arc::new(ConcatEncoder),
        dictionary: None,
        settings: Settings::default(),
        output_dir,
        cancellation: CancellationToken::new(),
        on_status: None,
        on_task_complete: None,
        on_task_error: None,
        on_error: None,
    }
}
