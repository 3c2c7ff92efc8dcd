use bookvoice_core::{SpeakerAssignment, VoiceId, NARRATOR};

/// Splits raw chapter text into LLM-sized blocks on blank lines, discarding empties.
pub fn text_blocks(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A sentence is pronounceable if it contains at least one Unicode letter or number.
pub fn is_pronounceable(text: &str) -> bool {
    text.chars().any(|c| c.is_alphanumeric())
}

/// One `SpeakerAssignment` per text block, all attributed to the narrator. Used when no LLM
/// is configured, so extraction/assignment/remap are skipped entirely and every line is read
/// back in the narrator's voice, in manuscript order.
pub fn narrator_only_assignments(text: &str, narrator_voice: &VoiceId) -> Vec<SpeakerAssignment> {
    text_blocks(text)
        .into_iter()
        .enumerate()
        .map(|(index, block)| SpeakerAssignment {
            sentence_index: index as u32,
            text: block,
            speaker: NARRATOR.to_string(),
            voice_id: narrator_voice.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_split_blocks_and_drop_empties() {
        let blocks = text_blocks("Para one.\n\n\nPara two.\n\n");
        assert_eq!(blocks, vec!["Para one.".to_string(), "Para two.".to_string()]);
    }

    #[test]
    fn punctuation_only_text_is_not_pronounceable() {
        assert!(!is_pronounceable("... --- !!!"));
        assert!(is_pronounceable("Hello, world."));
        assert!(is_pronounceable("42"));
    }

    #[test]
    fn narrator_only_assignments_cover_every_block_in_order() {
        let narrator = VoiceId::new("en-US,GuyNeural");
        let assignments = narrator_only_assignments("Para one.\n\nPara two.", &narrator);

        assert_eq!(assignments.len(), 2);
        assert!(assignments.iter().all(|a| a.speaker == NARRATOR));
        assert!(assignments.iter().all(|a| a.voice_id == narrator));
        assert_eq!(assignments[0].sentence_index, 0);
        assert_eq!(assignments[1].sentence_index, 1);
        assert_eq!(assignments[1].text, "Para two.");
    }
}
