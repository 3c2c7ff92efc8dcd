//! Initial, gender-based voice assignment (§4.3.1), run before speaker assignment exists.

use bookvoice_core::{Character, VoiceId, VoiceMap, VoicePool, FEMALE_UNNAMED, MALE_UNNAMED, UNKNOWN_UNNAMED};

use crate::sequential::SequentialPicker;

/// Assigns one voice per character (shared across all of a character's name variations),
/// then assigns the three sentinel keys. The narrator voice is never handed out to anyone.
pub fn allocate_by_gender(
    characters: &[Character],
    pool: &VoicePool,
    narrator_voice: &VoiceId,
) -> VoiceMap {
    let mut picker = SequentialPicker::new(pool, narrator_voice);
    let mut map = VoiceMap::new();

    for character in characters {
        let voice = picker
            .pick(character.gender)
            .unwrap_or_else(|| narrator_voice.clone());
        map.insert(character.canonical_name.clone(), voice.clone());
        for variation in &character.variations {
            map.insert(variation.clone(), voice.clone());
        }
    }

    let male_sentinel = picker
        .pick(bookvoice_core::Gender::Male)
        .unwrap_or_else(|| narrator_voice.clone());
    map.insert(MALE_UNNAMED.to_string(), male_sentinel);

    let female_sentinel = picker
        .pick(bookvoice_core::Gender::Female)
        .unwrap_or_else(|| narrator_voice.clone());
    map.insert(FEMALE_UNNAMED.to_string(), female_sentinel);

    let unknown_sentinel = picker
        .pick(bookvoice_core::Gender::Unknown)
        .unwrap_or_else(|| narrator_voice.clone());
    map.insert(UNKNOWN_UNNAMED.to_string(), unknown_sentinel);

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookvoice_core::Gender;

    #[test]
    fn sequential_voice_pick_with_narrator_reserved() {
        let pool = VoicePool::new(
            vec![VoiceId::new("en-US,NarratorNeural"), VoiceId::new("en-US,BrianNeural")],
            vec![],
        );
        let narrator = VoiceId::new("en-US,NarratorNeural");
        let characters = vec![Character::new("Bob", Gender::Male)];

        let map = allocate_by_gender(&characters, &pool, &narrator);

        assert_eq!(map.get("Bob"), Some(&VoiceId::new("en-US,BrianNeural")));
    }

    #[test]
    fn narrator_voice_is_never_handed_out_even_when_it_is_the_only_voice() {
        let pool = VoicePool::new(vec![VoiceId::new("N1")], vec![]);
        let narrator = VoiceId::new("N1");
        let characters = vec![Character::new("Solo", Gender::Male)];

        let map = allocate_by_gender(&characters, &pool, &narrator);

        // No other male voice exists; falling back to the narrator voice is the only
        // sane degenerate behavior, but it must never silently omit the character.
        assert_eq!(map.get("Solo"), Some(&VoiceId::new("N1")));
    }

    #[test]
    fn all_variations_of_a_character_map_to_the_same_voice() {
        let pool = VoicePool::new(vec![], vec![VoiceId::new("F1"), VoiceId::new("F2")]);
        let narrator = VoiceId::new("F1");
        let characters = vec![Character::new("Alice", Gender::Female)
            .with_variations(["Al".to_string(), "Allie".to_string()])];

        let map = allocate_by_gender(&characters, &pool, &narrator);

        let voice = map.get("Alice").cloned();
        assert_eq!(map.get("Al"), voice.as_ref());
        assert_eq!(map.get("Allie"), voice.as_ref());
    }

    #[test]
    fn unknown_gender_alternates_toward_the_pool_with_fewer_assignments() {
        let pool = VoicePool::new(vec![VoiceId::new("M1")], vec![VoiceId::new("F1")]);
        let narrator = VoiceId::new("narrator-unused");
        let characters = vec![
            Character::new("A", Gender::Unknown),
            Character::new("B", Gender::Unknown),
        ];

        let map = allocate_by_gender(&characters, &pool, &narrator);

        // Both pools start at 0; A takes male (ties favor male), then B takes female.
        assert_eq!(map.get("A"), Some(&VoiceId::new("M1")));
        assert_eq!(map.get("B"), Some(&VoiceId::new("F1")));
    }

    #[test]
    fn exhausted_pool_cycles_from_the_start_rather_than_erroring() {
        let pool = VoicePool::new(vec![VoiceId::new("M1")], vec![]);
        let narrator = VoiceId::new("narrator-unused");
        let characters = vec![
            Character::new("A", Gender::Male),
            Character::new("B", Gender::Male),
        ];

        let map = allocate_by_gender(&characters, &pool, &narrator);

        assert_eq!(map.get("A"), Some(&VoiceId::new("M1")));
        assert_eq!(map.get("B"), Some(&VoiceId::new("M1")));
    }
}
