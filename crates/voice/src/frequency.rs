//! Post-assignment frequency-based voice remap (§4.3.2).

use std::collections::HashMap;

use bookvoice_core::{Character, Gender, SpeakerAssignment, VoiceId, VoiceMap, VoicePool, NARRATOR};

use crate::sequential::{GenderBucket, SequentialPicker};

/// Counts dialogue lines per speaker, excluding narration.
fn count_lines(assignments: &[SpeakerAssignment]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for assignment in assignments {
        if assignment.speaker == NARRATOR {
            continue;
        }
        *counts.entry(assignment.speaker.clone()).or_insert(0) += 1;
    }
    counts
}

/// Reassigns voices to the highest-frequency speakers uniquely, and collapses everyone else
/// onto one shared "rare" voice per gender. Characters with zero counted dialogue lines
/// (including, typically, one literally named for the narrator) are left exactly as they
/// were in `base_voice_map` — this is how the narrator's own voice entry survives the remap
/// untouched.
pub fn allocate_by_frequency(
    base_voice_map: &VoiceMap,
    characters: &[Character],
    assignments: &[SpeakerAssignment],
    pool: &VoicePool,
    narrator_voice: &VoiceId,
) -> VoiceMap {
    let counts = count_lines(assignments);
    let mut map = base_voice_map.clone();

    let mut with_lines: Vec<(&Character, usize)> = characters
        .iter()
        .filter_map(|c| counts.get(&c.canonical_name).map(|&n| (c, n)))
        .filter(|(_, n)| *n > 0)
        .collect();
    // Stable sort: ties keep the original (first-appearance) order.
    with_lines.sort_by(|a, b| b.1.cmp(&a.1));

    let unique_slots = pool.size().saturating_sub(1).saturating_sub(3);
    let (unique, rare) = if unique_slots >= with_lines.len() {
        (with_lines.as_slice(), &with_lines[with_lines.len()..])
    } else {
        with_lines.split_at(unique_slots)
    };

    let mut picker = SequentialPicker::new(pool, narrator_voice);
    let mut assign = |character: &Character, voice: VoiceId| {
        map.insert(character.canonical_name.clone(), voice.clone());
        for variation in &character.variations {
            map.insert(variation.clone(), voice.clone());
        }
    };

    for (character, _) in unique {
        let voice = picker
            .pick(character.gender)
            .unwrap_or_else(|| narrator_voice.clone());
        assign(character, voice);
    }

    if !rare.is_empty() {
        let rare_male = picker.pick_bucket(GenderBucket::Male);
        let rare_female = picker.pick_bucket(GenderBucket::Female);
        let mut male_used = 0usize;
        let mut female_used = 0usize;

        for (character, _) in rare {
            let bucket = match character.gender {
                Gender::Male => GenderBucket::Male,
                Gender::Female => GenderBucket::Female,
                Gender::Unknown => {
                    if male_used <= female_used {
                        GenderBucket::Male
                    } else {
                        GenderBucket::Female
                    }
                }
            };
            let voice = match bucket {
                GenderBucket::Male => {
                    male_used += 1;
                    rare_male.clone().or_else(|| rare_female.clone())
                }
                GenderBucket::Female => {
                    female_used += 1;
                    rare_female.clone().or_else(|| rare_male.clone())
                }
            }
            .unwrap_or_else(|| narrator_voice.clone());
            assign(character, voice);
        }
    }

    map
}

/// Rewrites every assignment's `voice_id`: `narrator` always maps to `narrator_voice`;
/// everyone else maps through `voice_map`, falling back to the narrator voice if their
/// speaker name is somehow absent from the map.
pub fn remap_assignments(
    assignments: &[SpeakerAssignment],
    voice_map: &VoiceMap,
    narrator_voice: &VoiceId,
) -> Vec<SpeakerAssignment> {
    assignments
        .iter()
        .map(|a| {
            let voice_id = if a.speaker == NARRATOR {
                narrator_voice.clone()
            } else {
                voice_map
                    .get(&a.speaker)
                    .cloned()
                    .unwrap_or_else(|| narrator_voice.clone())
            };
            SpeakerAssignment {
                voice_id,
                ..a.clone()
            }
        })
        .collect()
}
