//! The data model threaded through the conversion pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel voice-map key for an unnamed male speaker.
pub const MALE_UNNAMED: &str = "MALE_UNNAMED";
/// Sentinel voice-map key for an unnamed female speaker.
pub const FEMALE_UNNAMED: &str = "FEMALE_UNNAMED";
/// Sentinel voice-map key for a speaker of unknown gender.
pub const UNKNOWN_UNNAMED: &str = "UNKNOWN_UNNAMED";
/// Reserved speaker name for narration (as opposed to a character's dialogue).
pub const NARRATOR: &str = "narrator";

/// A character's gender, as extracted by the LLM or assigned during review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// A named character, with the set of name variations the text uses to refer to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub canonical_name: String,
    pub gender: Gender,
    /// Ordered, unique variations (including the canonical name itself, by convention first).
    pub variations: Vec<String>,
}

impl Character {
    pub fn new(canonical_name: impl Into<String>, gender: Gender) -> Self {
        let canonical_name = canonical_name.into();
        Self {
            variations: vec![canonical_name.clone()],
            canonical_name,
            gender,
        }
    }

    pub fn with_variations(mut self, variations: impl IntoIterator<Item = String>) -> Self {
        for v in variations {
            if !self.variations.contains(&v) {
                self.variations.push(v);
            }
        }
        self
    }
}

/// An opaque TTS voice identifier, e.g. `"en-US, GuyNeural"`. Equality is byte-exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(pub String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VoiceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The enabled voice pool, split by gender. No `VoiceId` appears in both sequences;
/// the narrator voice may be present in either (it is simply never handed out by the
/// allocator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePool {
    pub male: Vec<VoiceId>,
    pub female: Vec<VoiceId>,
}

impl VoicePool {
    pub fn new(male: Vec<VoiceId>, female: Vec<VoiceId>) -> Self {
        Self { male, female }
    }

    /// Total number of distinct voices across both gender pools.
    pub fn size(&self) -> usize {
        self.male.len() + self.female.len()
    }

    pub fn pool_for(&self, gender: Gender) -> &[VoiceId] {
        match gender {
            Gender::Male => &self.male,
            Gender::Female | Gender::Unknown => &self.female,
        }
    }
}

/// Canonical character name (or a sentinel key) to assigned `VoiceId`.
pub type VoiceMap = BTreeMap<String, VoiceId>;

/// One sentence's speaker assignment and the voice it will be synthesized with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerAssignment {
    pub sentence_index: u32,
    pub text: String,
    /// Canonical character name, or `NARRATOR`.
    pub speaker: String,
    pub voice_id: VoiceId,
}

/// A chapter boundary: the chapter's display name and the sentence index it starts at.
pub type FileNameEntry = (String, u32);

/// A chunk of synthesized audio persisted to `_temp_work/chunk_NNNNNN.bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub part_index: u32,
    pub filename: String,
}

impl AudioChunk {
    /// Renders the canonical on-disk filename for a given part index.
    pub fn filename_for(part_index: u32) -> String {
        format!("chunk_{part_index:06}.bin")
    }
}

/// A contiguous run of chunks slated to become a single merged output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    pub from_index: u32,
    pub to_index: u32,
    pub filename: String,
    pub merge_number: u32,
    pub duration_ms: u64,
}

impl MergeGroup {
    /// Every part index in `[from_index, to_index]`, inclusive, ascending.
    pub fn part_indexes(&self) -> impl Iterator<Item = u32> {
        self.from_index..=self.to_index
    }
}

/// The on-disk resume artifact written by the speaker-assignment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub assignments: Vec<SpeakerAssignment>,
    #[serde(rename = "characterVoiceMap")]
    pub character_voice_map: BTreeMap<String, String>,
    pub characters: Vec<Character>,
    #[serde(rename = "fileNames")]
    pub file_names: Vec<FileNameEntry>,
}

/// Context keys a `PipelineStep` may require as a precondition or drop as a postcondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    Text,
    FileNames,
    Characters,
    VoiceMap,
    Assignments,
    AudioMap,
    TempDirHandle,
    FailedTasks,
    SavedFileCount,
}

/// The shared, monotonic context threaded through every pipeline step.
///
/// Fields are only ever set or dropped by the step that declares ownership of them in its
/// `required_keys`/`drops_keys`; no step silently mutates a field it did not declare.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub text: String,
    pub file_names: Vec<FileNameEntry>,
    pub characters: Option<Vec<Character>>,
    pub voice_map: Option<VoiceMap>,
    pub assignments: Option<Vec<SpeakerAssignment>>,
    pub audio_map: Option<BTreeMap<u32, String>>,
    pub temp_dir_handle: Option<std::path::PathBuf>,
    pub failed_tasks: Option<Vec<u32>>,
    pub saved_file_count: Option<usize>,
}

impl PipelineContext {
    pub fn new(text: impl Into<String>, file_names: Vec<FileNameEntry>) -> Self {
        Self {
            text: text.into(),
            file_names,
            ..Default::default()
        }
    }

    pub fn has(&self, key: ContextKey) -> bool {
        match key {
            ContextKey::Text => !self.text.is_empty(),
            ContextKey::FileNames => !self.file_names.is_empty(),
            ContextKey::Characters => self.characters.is_some(),
            ContextKey::VoiceMap => self.voice_map.is_some(),
            ContextKey::Assignments => self.assignments.is_some(),
            ContextKey::AudioMap => self.audio_map.is_some(),
            ContextKey::TempDirHandle => self.temp_dir_handle.is_some(),
            ContextKey::FailedTasks => self.failed_tasks.is_some(),
            ContextKey::SavedFileCount => self.saved_file_count.is_some(),
        }
    }

    pub fn drop_key(&mut self, key: ContextKey) {
        match key {
            ContextKey::Text => self.text.clear(),
            ContextKey::FileNames => self.file_names.clear(),
            ContextKey::Characters => self.characters = None,
            ContextKey::VoiceMap => self.voice_map = None,
            ContextKey::Assignments => self.assignments = None,
            ContextKey::AudioMap => self.audio_map = None,
            ContextKey::TempDirHandle => self.temp_dir_handle = None,
            ContextKey::FailedTasks => self.failed_tasks = None,
            ContextKey::SavedFileCount => self.saved_file_count = None,
        }
    }

    pub fn from_resumed_state(mut self, state: PipelineState) -> Self {
        let voice_map = state
            .character_voice_map
            .into_iter()
            .map(|(name, voice)| (name, VoiceId::new(voice)))
            .collect();
        self.characters = Some(state.characters);
        self.voice_map = Some(voice_map);
        self.assignments = Some(state.assignments);
        self.file_names = state.file_names;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_chunk_filename_is_zero_padded_to_six_digits() {
        assert_eq!(AudioChunk::filename_for(0), "chunk_000000.bin");
        assert_eq!(AudioChunk::filename_for(42), "chunk_000042.bin");
        assert_eq!(AudioChunk::filename_for(123_456), "chunk_123456.bin");
    }

    #[test]
    fn merge_group_part_indexes_are_contiguous_and_ascending() {
        let group = MergeGroup {
            from_index: 3,
            to_index: 6,
            filename: "Chapter 1.opus".into(),
            merge_number: 0,
            duration_ms: 1000,
        };
        assert_eq!(group.part_indexes().collect::<Vec<_>>(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn voice_pool_size_counts_both_genders() {
        let pool = VoicePool::new(
            vec![VoiceId::new("M1"), VoiceId::new("M2")],
            vec![VoiceId::new("F1")],
        );
        assert_eq!(pool.size(), 3);
    }
}
