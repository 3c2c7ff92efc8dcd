use std::path::{Path, PathBuf};

use bookvoice_core::PipelineState;

use crate::error::PipelineError;

/// What `ResumeManager::check` found for a prior, interrupted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeInfo {
    /// Number of `chunk_*.bin` files already synthesized and sitting in `_temp_work/`.
    pub cached_chunks: usize,
    /// Always `true` when `Some(ResumeInfo)` is returned — `check` only returns `Some` once
    /// it has confirmed `pipeline_state.json` exists, so this just names that fact for the
    /// caller rather than making it infer it from `Option`-ness.
    pub has_llm_state: bool,
}

/// Reads and writes the on-disk `pipeline_state.json` resume artifact, kept under
/// `_temp_work/` next to the chunk files it describes.
pub struct ResumeManager;

impl ResumeManager {
    fn temp_work_dir(output_dir: &Path) -> PathBuf {
        output_dir.join("_temp_work")
    }

    pub fn state_path(output_dir: &Path) -> PathBuf {
        Self::temp_work_dir(output_dir).join("pipeline_state.json")
    }

    /// `None` if `_temp_work/pipeline_state.json` doesn't exist (or is empty); otherwise the
    /// count of already-synthesized chunks alongside it.
    pub async fn check(output_dir: &Path) -> Option<ResumeInfo> {
        let has_llm_state = tokio::fs::metadata(Self::state_path(output_dir))
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !has_llm_state {
            return None;
        }

        let mut cached_chunks = 0usize;
        if let Ok(mut entries) = tokio::fs::read_dir(Self::temp_work_dir(output_dir)).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with("chunk_") && name.ends_with(".bin") {
                    cached_chunks += 1;
                }
            }
        }

        Some(ResumeInfo {
            cached_chunks,
            has_llm_state,
        })
    }

    pub async fn load_state(output_dir: &Path) -> Result<Option<PipelineState>, PipelineError> {
        let path = Self::state_path(output_dir);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let state = serde_json::from_slice(&bytes).map_err(|source| PipelineError::State {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(Some(state))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PipelineError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Creates `_temp_work/` if needed and writes `pipeline_state.json`. Called from the
    /// `AssignSpeakers` step once assignments are produced; the caller treats failure as
    /// best-effort (log a warning, keep running) rather than aborting the conversion.
    pub async fn save_state(output_dir: &Path, state: &PipelineState) -> Result<(), PipelineError> {
        let dir = Self::temp_work_dir(output_dir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| PipelineError::Io {
                path: dir.display().to_string(),
                source,
            })?;

        let path = Self::state_path(output_dir);
        let bytes = serde_json::to_vec_pretty(state).map_err(|source| PipelineError::State {
            path: path.display().to_string(),
            source,
        })?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| PipelineError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookvoice_core::{Character, Gender, SpeakerAssignment, VoiceId};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_state_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        assert!(ResumeManager::check(dir.path()).await.is_none());
        assert!(ResumeManager::load_state(dir.path()).await.unwrap().is_none());
    }

    fn sample_state() -> PipelineState {
        let mut voice_map = BTreeMap::new();
        voice_map.insert("Alice".to_string(), "F1".to_string());
        PipelineState {
            assignments: vec![SpeakerAssignment {
                sentence_index: 0,
                text: "hi".into(),
                speaker: "Alice".into(),
                voice_id: VoiceId::new("F1"),
            }],
            character_voice_map: voice_map,
            characters: vec![Character::new("Alice", Gender::Female)],
            file_names: vec![("Chapter 1".to_string(), 0)],
        }
    }

    #[tokio::test]
    async fn saved_state_round_trips_under_temp_work() {
        let dir = tempdir().unwrap();
        let state = sample_state();

        ResumeManager::save_state(dir.path(), &state).await.unwrap();
        assert!(ResumeManager::state_path(dir.path()).starts_with(dir.path().join("_temp_work")));

        let info = ResumeManager::check(dir.path()).await.unwrap();
        assert!(info.has_llm_state);
        assert_eq!(info.cached_chunks, 0);

        let loaded = ResumeManager::load_state(dir.path()).await.unwrap().unwrap();
        assert_eq!(loaded.characters.len(), 1);
        assert_eq!(loaded.assignments.len(), 1);
    }

    #[tokio::test]
    async fn check_counts_cached_chunks_alongside_the_state_file() {
        let dir = tempdir().unwrap();
        ResumeManager::save_state(dir.path(), &sample_state()).await.unwrap();

        let temp_work = dir.path().join("_temp_work");
        tokio::fs::write(temp_work.join("chunk_000000.bin"), vec![1u8; 4]).await.unwrap();
        tokio::fs::write(temp_work.join("chunk_000001.bin"), vec![1u8; 4]).await.unwrap();
        tokio::fs::write(temp_work.join("not_a_chunk.txt"), b"ignored").await.unwrap();

        let info = ResumeManager::check(dir.path()).await.unwrap();
        assert_eq!(info.cached_chunks, 2);
    }
}
