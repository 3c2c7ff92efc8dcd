//! Placeholder collaborator adapters.
//!
//! The TTS client and the audio encoder are explicitly out of scope for this crate (they
//! belong to whatever WebSocket/ffmpeg integration a deployment picks). These stand in so the
//! binary links, and fail loudly and immediately for anything that actually needs a real
//! adapter. There is no placeholder LLM adapter: this binary wires `llm: None` into the
//! orchestrator and always runs the narrator-only path until a deployment supplies a real
//! `LlmService`.

use async_trait::async_trait;
use bookvoice_core::{
    AudioEncoder, CodecOpts, CoreError, DictionaryService, FilterChain, KeepAwake, TtsSynth,
};

pub struct UnconfiguredTts;

#[async_trait]
impl TtsSynth for UnconfiguredTts {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        _rate: f32,
        _pitch: f32,
        _volume: f32,
    ) -> Result<Vec<u8>, CoreError> {
        Err(CoreError::Fatal(
            "no TtsSynth adapter configured; wire a concrete client before running a real book"
                .to_string(),
        ))
    }
}

pub struct UnconfiguredEncoder;

#[async_trait]
impl AudioEncoder for UnconfiguredEncoder {
    async fn concat_and_filter(
        &self,
        _input_bytes: &[Vec<u8>],
        _inter_gap_ms: u32,
        _filter_chain: FilterChain,
        _codec_opts: &CodecOpts,
    ) -> Result<Vec<u8>, CoreError> {
        Err(CoreError::Fatal(
            "no AudioEncoder adapter configured; wire a concrete ffmpeg integration before running a real book"
                .to_string(),
        ))
    }
}

pub struct NoopDictionary;

#[async_trait]
impl DictionaryService for NoopDictionary {
    async fn apply(&self, text: &str) -> Result<String, CoreError> {
        Ok(text.to_string())
    }
}

/// No wake-lock support; this binary runs to completion on a normal process lifetime with no
/// host-sleep concerns of its own.
pub struct NoopKeepAwake;

#[async_trait]
impl KeepAwake for NoopKeepAwake {
    async fn acquire(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn release(&self) {}
}
