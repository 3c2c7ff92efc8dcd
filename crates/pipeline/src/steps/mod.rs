//! The nine steps of a conversion run, in execution order.

mod apply_dictionary;
mod assign_speakers;
mod assign_voices_initial;
mod audio_merge;
mod cleanup;
mod extract_characters;
mod remap_voices;
mod sanitize;
mod tts_convert;

pub use apply_dictionary::ApplyDictionary;
pub use assign_speakers::AssignSpeakers;
pub use assign_voices_initial::AssignVoicesInitial;
pub use audio_merge::AudioMerge;
pub use cleanup::Cleanup;
pub use extract_characters::ExtractCharacters;
pub use remap_voices::RemapVoices;
pub use sanitize::Sanitize;
pub use tts_convert::TtsConvert;
