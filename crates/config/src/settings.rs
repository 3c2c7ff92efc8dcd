//! Layered settings for a conversion run.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment, controlling how strictly `Settings::validate` enforces bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Exponential-backoff-with-full-jitter retry tuning for the TTS worker pool (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay_ms() -> u64 {
    2_000
}
fn default_max_delay_ms() -> u64 {
    60_000
}
fn default_max_attempts() -> u32 {
    3
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// TTS worker pool concurrency (§4.2) and LLM fan-out (§5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_llm_threads")]
    pub llm_threads: usize,
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_max_workers() -> usize {
    4
}
fn default_llm_threads() -> usize {
    2
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            llm_threads: default_llm_threads(),
            retry: RetrySettings::default(),
        }
    }
}

/// Voice allocation inputs (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default = "default_narrator_voice")]
    pub narrator_voice: String,
    /// Voice pool available to male characters, gender-split per §4.3's allocator inputs.
    #[serde(default)]
    pub male_voices: Vec<String>,
    /// Voice pool available to female characters.
    #[serde(default)]
    pub female_voices: Vec<String>,
    #[serde(default = "default_rate")]
    pub rate: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_narrator_voice() -> String {
    "en-US, GuyNeural".to_string()
}
fn default_rate() -> f32 {
    1.0
}
fn default_volume() -> f32 {
    1.0
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            narrator_voice: default_narrator_voice(),
            male_voices: Vec::new(),
            female_voices: Vec::new(),
            rate: default_rate(),
            pitch: 0.0,
            volume: default_volume(),
        }
    }
}

/// Output container selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Opus,
    Mp3,
}

/// Merge planning, filter chain, and codec tuning (§4.4, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSettings {
    #[serde(default = "default_target_duration_ms")]
    pub target_duration_ms: u64,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "default_silence_gap_ms")]
    pub silence_gap_ms: u32,
    #[serde(default = "default_true")]
    pub eq: bool,
    #[serde(default)]
    pub de_ess: bool,
    #[serde(default)]
    pub silence_removal: bool,
    #[serde(default = "default_true")]
    pub compressor: bool,
    #[serde(default = "default_true")]
    pub normalization: bool,
    #[serde(default)]
    pub fade_in: bool,
    #[serde(default)]
    pub stereo_width: bool,
    #[serde(default = "default_opus_min_bitrate")]
    pub opus_min_bitrate: u32,
    #[serde(default = "default_opus_max_bitrate")]
    pub opus_max_bitrate: u32,
    #[serde(default = "default_opus_compression_level")]
    pub opus_compression_level: u8,
}

fn default_target_duration_ms() -> u64 {
    20 * 60 * 1000
}
fn default_silence_gap_ms() -> u32 {
    150
}
fn default_opus_min_bitrate() -> u32 {
    24_000
}
fn default_opus_max_bitrate() -> u32 {
    64_000
}
fn default_opus_compression_level() -> u8 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            target_duration_ms: default_target_duration_ms(),
            output_format: OutputFormat::default(),
            silence_gap_ms: default_silence_gap_ms(),
            eq: true,
            de_ess: false,
            silence_removal: false,
            compressor: true,
            normalization: true,
            fade_in: false,
            stereo_width: false,
            opus_min_bitrate: default_opus_min_bitrate(),
            opus_max_bitrate: default_opus_max_bitrate(),
            opus_compression_level: default_opus_compression_level(),
        }
    }
}

/// LLM-stage tuning (character extraction and speaker assignment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub voting: bool,
    #[serde(default)]
    pub use_streaming: bool,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default)]
    pub reasoning_level: Option<String>,
}

fn default_temperature() -> f32 {
    0.2
}
fn default_top_p() -> f32 {
    0.9
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            voting: false,
            use_streaming: false,
            temperature: default_temperature(),
            top_p: default_top_p(),
            reasoning_level: None,
        }
    }
}

/// Structured-logging tuning. No exporter is wired by this crate; a host binary may attach
/// one behind the `telemetry` feature without touching library code (§10.5).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilitySettings {
    #[serde(default)]
    pub json_logs: bool,
    #[serde(default)]
    pub metrics_enabled: bool,
}

/// The full, layered configuration for one conversion run. See `load_settings` for
/// precedence. An owned clone of this, taken once, is the orchestrator's "input snapshot"
/// (§4.7, §9): later edits to a live config object cannot perturb a conversion in flight.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub voice: VoiceSettings,
    #[serde(default)]
    pub merge: MergeSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_worker()?;
        self.validate_merge()?;
        self.validate_llm()?;
        self.validate_voice()?;
        Ok(())
    }

    fn validate_voice(&self) -> Result<(), ConfigError> {
        if self.voice.narrator_voice.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "voice.narrator_voice".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn validate_worker(&self) -> Result<(), ConfigError> {
        if self.worker.max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.max_workers".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.worker.retry.base_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.retry.base_delay_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.worker.retry.max_delay_ms < self.worker.retry.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "worker.retry.max_delay_ms".to_string(),
                message: "must be >= base_delay_ms".to_string(),
            });
        }
        Ok(())
    }

    fn validate_merge(&self) -> Result<(), ConfigError> {
        if self.merge.target_duration_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "merge.target_duration_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.merge.silence_gap_ms > 500 {
            return Err(ConfigError::InvalidValue {
                field: "merge.silence_gap_ms".to_string(),
                message: "must be between 0 and 500ms".to_string(),
            });
        }
        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.llm.top_p) {
            return Err(ConfigError::InvalidValue {
                field: "llm.top_p".to_string(),
                message: format!("must be between 0.0 and 1.0, got {}", self.llm.top_p),
            });
        }
        Ok(())
    }
}

/// Loads layered settings: built-in defaults, then `config/default.{yaml,toml}`, then
/// `config/{env}.{yaml,toml}`, then `BOOKVOICE_*` environment variables — each layer
/// overriding the previous.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("BOOKVOICE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
