//! Layered configuration for the book-to-audiobook conversion orchestrator.
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`BOOKVOICE_` prefix)
//! - Built-in defaults
//!
//! Precedence, highest first: environment variables > `config/{env}.yaml` > `config/default.yaml`
//! > built-in defaults (`Settings::default()`).

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{
    load_settings, LlmSettings, MergeSettings, ObservabilitySettings, OutputFormat,
    RetrySettings, RuntimeEnvironment, Settings, VoiceSettings, WorkerSettings,
};
