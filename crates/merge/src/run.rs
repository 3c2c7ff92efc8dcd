//! Executes a merge plan: loads chunk bytes, invokes the encoder collaborator, writes output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bookvoice_core::{AudioChunk, AudioEncoder, CodecOpts, FileNameEntry, FilterChain, MergeGroup};
use tracing::{info, warn};

use crate::error::MergeError;
use crate::planner::{plan_groups, ChunkInfo};

/// An existing output file larger than this is treated as a complete, cached merge; anything
/// smaller or missing is (re)encoded.
const RESUME_MIN_OUTPUT_BYTES: u64 = 1024;

/// Decodes each chunk's duration via the MP3 parser and returns chunk metadata sorted by
/// `part_index`, alongside the raw bytes keyed by `part_index` for later concatenation.
pub fn load_chunk_durations(
    chunk_bytes: &BTreeMap<u32, Vec<u8>>,
) -> Result<Vec<ChunkInfo>, MergeError> {
    let mut infos = Vec::with_capacity(chunk_bytes.len());
    for (&part_index, bytes) in chunk_bytes {
        let duration_ms = bookvoice_audio::parse_duration_default(bytes)
            .ok_or(MergeError::UnparseableChunk { part_index })?;
        infos.push(ChunkInfo { part_index, duration_ms });
    }
    infos.sort_by_key(|c| c.part_index);
    Ok(infos)
}

/// Runs the full merge: plans groups, then for each one either skips it (cached, resume) or
/// concatenates + filters + encodes it via `encoder` and writes it under `output_dir`.
///
/// Returns the number of groups actually (re)encoded this run, i.e. `savedFileCount`.
pub async fn run_merge(
    chunk_bytes: &BTreeMap<u32, Vec<u8>>,
    file_names: &[FileNameEntry],
    target_duration_ms: u64,
    silence_gap_ms: u32,
    filter_chain: FilterChain,
    codec_opts: &CodecOpts,
    output_dir: &Path,
    encoder: Arc<dyn AudioEncoder>,
) -> Result<usize, MergeError> {
    let chunk_infos = load_chunk_durations(chunk_bytes)?;
    let groups = plan_groups(&chunk_infos, file_names, target_duration_ms);

    let mut saved_file_count = 0;
    for group in &groups {
        let output_path = output_path_for(output_dir, group);
        if is_cached(&output_path).await {
            info!(file = %group.filename, "merge group already encoded, skipping");
            continue;
        }

        let inputs: Vec<Vec<u8>> = group
            .part_indexes()
            .map(|idx| {
                chunk_bytes
                    .get(&idx)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        let encoded = encoder
            .concat_and_filter(&inputs, silence_gap_ms, filter_chain, codec_opts)
            .await?;

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| MergeError::OutputWrite {
                    path: parent.display().to_string(),
                    source,
                })?;
        }
        tokio::fs::write(&output_path, &encoded)
            .await
            .map_err(|source| MergeError::OutputWrite {
                path: output_path.display().to_string(),
                source,
            })?;
        saved_file_count += 1;
    }

    Ok(saved_file_count)
}

fn output_path_for(output_dir: &Path, group: &MergeGroup) -> PathBuf {
    let chapter_folder = group
        .filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&group.filename);
    // A group's folder is named after its chapter, stripping any "(N)" merge suffix.
    let chapter_folder = chapter_folder
        .rfind(" (")
        .map(|idx| &chapter_folder[..idx])
        .unwrap_or(chapter_folder);
    output_dir.join(chapter_folder).join(&group.filename)
}

async fn is_cached(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len() > RESUME_MIN_OUTPUT_BYTES,
        Err(_) => false,
    }
}

/// Reads every `chunk_NNNNNN.bin` present under `temp_dir` for the given part indexes.
pub async fn load_chunks_from_disk(
    temp_dir: &Path,
    part_indexes: impl IntoIterator<Item = u32>,
) -> Result<BTreeMap<u32, Vec<u8>>, MergeError> {
    let mut out = BTreeMap::new();
    for part_index in part_indexes {
        let path = temp_dir.join(AudioChunk::filename_for(part_index));
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                out.insert(part_index, bytes);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(part_index, "chunk file missing, skipping from merge input");
            }
            Err(source) => {
                return Err(MergeError::ChunkRead {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bookvoice_core::CoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct CountingEncoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AudioEncoder for CountingEncoder {
        async fn concat_and_filter(
            &self,
            input_bytes: &[Vec<u8>],
            _inter_gap_ms: u32,
            _filter_chain: FilterChain,
            _codec_opts: &CodecOpts,
        ) -> Result<Vec<u8>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(input_bytes.concat())
        }
    }

    fn mp3_frame_bytes(n_frames: usize) -> Vec<u8> {
        let mut buf = vec![0xFFu8, 0xF2, 0xA4, 0xC0];
        buf.resize(288, 0);
        let mut out = Vec::new();
        for _ in 0..n_frames {
            out.extend_from_slice(&buf);
        }
        out
    }

    #[tokio::test]
    async fn skips_groups_whose_output_is_already_cached() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let chapter_dir = output_dir.join("Chapter 1");
        tokio::fs::create_dir_all(&chapter_dir).await.unwrap();
        tokio::fs::write(chapter_dir.join("Chapter 1.opus"), vec![0u8; 2048])
            .await
            .unwrap();

        let mut chunk_bytes = BTreeMap::new();
        chunk_bytes.insert(0, mp3_frame_bytes(10));
        let file_names = vec![("Chapter 1".to_string(), 0)];
        let encoder = Arc::new(CountingEncoder { calls: AtomicUsize::new(0) });

        let saved = run_merge(
            &chunk_bytes,
            &file_names,
            20 * 60 * 1000,
            150,
            FilterChain::default(),
            &CodecOpts::Opus { min_bitrate: 24000, max_bitrate: 64000, compression_level: 10 },
            &output_dir,
            encoder.clone(),
        )
        .await
        .unwrap();

        assert_eq!(saved, 0);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn encodes_and_writes_groups_that_are_not_cached() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("out");

        let mut chunk_bytes = BTreeMap::new();
        chunk_bytes.insert(0, mp3_frame_bytes(10));
        chunk_bytes.insert(1, mp3_frame_bytes(10));
        let file_names = vec![("Chapter 1".to_string(), 0)];
        let encoder = Arc::new(CountingEncoder { calls: AtomicUsize::new(0) });

        let saved = run_merge(
            &chunk_bytes,
            &file_names,
            20 * 60 * 1000,
            150,
            FilterChain::default(),
            &CodecOpts::Opus { min_bitrate: 24000, max_bitrate: 64000, compression_level: 10 },
            &output_dir,
            encoder.clone(),
        )
        .await
        .unwrap();

        assert_eq!(saved, 1);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
        assert!(output_dir.join("Chapter 1").join("Chapter 1.opus").exists());
    }
}
