//! Groups chunks into target-duration merge groups, respecting chapter boundaries (§4.4).

use bookvoice_core::{FileNameEntry, MergeGroup};

/// A chunk's identity and decoded duration, as known before any merging happens.
#[derive(Debug, Clone, Copy)]
pub struct ChunkInfo {
    pub part_index: u32,
    pub duration_ms: u64,
}

/// Finds the chapter name whose declared start sentence index is the greatest one
/// not exceeding `part_index`. `file_names` need not be sorted; falls back to the
/// first entry (or a generic name) if `part_index` precedes every declared chapter.
fn chapter_for(part_index: u32, file_names: &[FileNameEntry]) -> &str {
    file_names
        .iter()
        .filter(|(_, start)| *start <= part_index)
        .max_by_key(|(_, start)| *start)
        .or_else(|| file_names.first())
        .map(|(name, _)| name.as_str())
        .unwrap_or("Chapter 1")
}

/// Plans contiguous merge groups over `chunks` (assumed already sorted ascending by
/// `part_index`), splitting whenever the next chunk would exceed `target_duration_ms`
/// or crosses a chapter boundary declared in `file_names`.
pub fn plan_groups(
    chunks: &[ChunkInfo],
    file_names: &[FileNameEntry],
    target_duration_ms: u64,
) -> Vec<MergeGroup> {
    let mut groups = Vec::new();
    let mut chapter_merge_numbers: std::collections::HashMap<String, u32> =
        std::collections::HashMap::new();

    let mut current_start: Option<usize> = None;
    let mut current_duration: u64 = 0;
    let mut current_chapter: String = String::new();

    let mut close_group = |start_idx: usize, end_idx: usize, chapter: &str, duration_ms: u64| {
        let merge_number = chapter_merge_numbers.entry(chapter.to_string()).or_insert(0);
        let filename = if *merge_number == 0 {
            format!("{chapter}.opus")
        } else {
            format!("{chapter} ({merge_number}).opus")
        };
        let group = MergeGroup {
            from_index: chunks[start_idx].part_index,
            to_index: chunks[end_idx].part_index,
            filename,
            merge_number: *merge_number,
            duration_ms,
        };
        *merge_number += 1;
        group
    };

    for (i, chunk) in chunks.iter().enumerate() {
        let chapter = chapter_for(chunk.part_index, file_names).to_string();
        let crosses_chapter = current_start.is_some() && chapter != current_chapter;
        let would_exceed =
            current_start.is_some() && current_duration + chunk.duration_ms > target_duration_ms;

        if crosses_chapter || would_exceed {
            let start_idx = current_start.take().unwrap();
            groups.push(close_group(start_idx, i - 1, &current_chapter, current_duration));
            current_duration = 0;
        }

        if current_start.is_none() {
            current_start = Some(i);
            current_chapter = chapter;
            current_duration = 0;
        }
        current_duration += chunk.duration_ms;
    }

    if let Some(start_idx) = current_start {
        let end_idx = chunks.len() - 1;
        groups.push(close_group(start_idx, end_idx, &current_chapter, current_duration));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(part_index: u32, duration_ms: u64) -> ChunkInfo {
        ChunkInfo { part_index, duration_ms }
    }

    #[test]
    fn groups_split_when_target_duration_would_be_exceeded() {
        let chunks = vec![chunk(0, 600_000), chunk(1, 600_000), chunk(2, 600_000)];
        let file_names = vec![("Chapter 1".to_string(), 0)];

        let groups = plan_groups(&chunks, &file_names, 1_000_000);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].from_index, 0);
        assert_eq!(groups[0].to_index, 0);
        assert_eq!(groups[1].from_index, 1);
        assert_eq!(groups[1].to_index, 2);
    }

    #[test]
    fn groups_split_on_chapter_boundary_even_under_target_duration() {
        let chunks = vec![chunk(0, 1_000), chunk(1, 1_000), chunk(2, 1_000)];
        let file_names = vec![("Chapter 1".to_string(), 0), ("Chapter 2".to_string(), 2)];

        let groups = plan_groups(&chunks, &file_names, 1_000_000);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].filename, "Chapter 1.opus");
        assert_eq!(groups[1].filename, "Chapter 2.opus");
    }

    #[test]
    fn part_indexes_are_contiguous_and_ascending_within_every_group() {
        let chunks: Vec<_> = (0..10).map(|i| chunk(i, 100)).collect();
        let file_names = vec![("Chapter 1".to_string(), 0)];

        let groups = plan_groups(&chunks, &file_names, 350);

        for group in &groups {
            let indexes: Vec<u32> = group.part_indexes().collect();
            for window in indexes.windows(2) {
                assert_eq!(window[1], window[0] + 1);
            }
        }
    }

    #[test]
    fn a_chapter_spanning_multiple_groups_numbers_them_sequentially() {
        let chunks = vec![chunk(0, 900), chunk(1, 900), chunk(2, 900)];
        let file_names = vec![("Chapter 1".to_string(), 0)];

        let groups = plan_groups(&chunks, &file_names, 1_000);

        assert_eq!(groups[0].filename, "Chapter 1.opus");
        assert_eq!(groups[1].filename, "Chapter 1 (1).opus");
    }
}
