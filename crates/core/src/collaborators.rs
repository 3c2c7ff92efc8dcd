//! Collaborator interfaces the core consumes but never implements.
//!
//! Concrete adapters (an LLM HTTP client, a TTS WebSocket client, an ffmpeg-backed encoder)
//! live outside this crate entirely; these traits are the seam.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::{Character, SpeakerAssignment, VoiceMap};

/// A progress callback invoked with `(completed, total)`.
pub type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

/// LLM-driven character extraction and speaker assignment.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Accepts ordered text blocks; returns a merged, deduplicated character list including
    /// variations and gender.
    async fn extract_characters(
        &self,
        text_blocks: &[String],
        on_progress: Option<ProgressFn>,
    ) -> Result<Vec<Character>, CoreError>;

    /// One assignment per sentence in input order; `speaker` is either a canonical character
    /// name or `"narrator"`.
    async fn assign_speakers(
        &self,
        text_blocks: &[String],
        voice_map: &VoiceMap,
        characters: &[Character],
        on_progress: Option<ProgressFn>,
    ) -> Result<Vec<SpeakerAssignment>, CoreError>;
}

/// A single-utterance TTS adapter. The wire format is raw MPEG audio; Edge TTS produces
/// 24 kHz, Layer III, 96 kbps, mono.
#[async_trait]
pub trait TtsSynth: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        rate: f32,
        pitch: f32,
        volume: f32,
    ) -> Result<Vec<u8>, CoreError>;
}

/// The canonical filter chain order, each stage independently toggleable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterChain {
    pub eq: bool,
    pub de_ess: bool,
    pub silence_removal: bool,
    pub compressor: bool,
    pub normalization: bool,
    pub fade_in: bool,
    pub stereo_width: bool,
}

/// Output codec selection and tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecOpts {
    Opus {
        min_bitrate: u32,
        max_bitrate: u32,
        compression_level: u8,
    },
    Mp3 {
        bitrate: u32,
        vbr: bool,
    },
}

/// Pronunciation-dictionary rule lookup and application. File loading and rule parsing are
/// the implementer's concern; this crate only ever applies already-parsed rules to text.
#[async_trait]
pub trait DictionaryService: Send + Sync {
    /// Rewrites `text` according to configured pronunciation rules (e.g. acronym expansion).
    async fn apply(&self, text: &str) -> Result<String, CoreError>;
}

/// Concatenates raw audio byte buffers, applies the filter chain, and re-encodes.
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    async fn concat_and_filter(
        &self,
        input_bytes: &[Vec<u8>],
        inter_gap_ms: u32,
        filter_chain: FilterChain,
        codec_opts: &CodecOpts,
    ) -> Result<Vec<u8>, CoreError>;
}

/// Best-effort, process-global signal to keep the host awake for the duration of a run (e.g.
/// an OS wake lock). Acquired once at the start of a conversion and released on completion or
/// error; implementations that have no such concept (most server deployments) are a no-op.
#[async_trait]
pub trait KeepAwake: Send + Sync {
    async fn acquire(&self) -> Result<(), CoreError>;
    async fn release(&self);
}
