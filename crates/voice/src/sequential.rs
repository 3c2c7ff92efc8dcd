//! Deterministic, sequential (never random) voice picking from a gender-split pool.
//!
//! Picking is "first voice not yet used, then cycle from the start" — which is exactly a
//! running counter modulo the pool length, so a single per-gender counter suffices for both
//! the non-duplicating and the cycling regime.

use bookvoice_core::{Gender, VoiceId, VoicePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderBucket {
    Male,
    Female,
}

/// Tracks per-gender pick counters over a pool with the narrator voice excluded.
pub struct SequentialPicker {
    male_pool: Vec<VoiceId>,
    female_pool: Vec<VoiceId>,
    male_count: usize,
    female_count: usize,
}

impl SequentialPicker {
    pub fn new(pool: &VoicePool, narrator_voice: &VoiceId) -> Self {
        let male_pool = pool
            .male
            .iter()
            .filter(|v| *v != narrator_voice)
            .cloned()
            .collect();
        let female_pool = pool
            .female
            .iter()
            .filter(|v| *v != narrator_voice)
            .cloned()
            .collect();
        Self {
            male_pool,
            female_pool,
            male_count: 0,
            female_count: 0,
        }
    }

    pub fn male_assigned(&self) -> usize {
        self.male_count
    }

    pub fn female_assigned(&self) -> usize {
        self.female_count
    }

    /// Picks from a specific gender bucket, cycling once the pool is exhausted. Returns
    /// `None` only if that gender's filtered pool is empty.
    pub fn pick_bucket(&mut self, bucket: GenderBucket) -> Option<VoiceId> {
        let (pool, count) = match bucket {
            GenderBucket::Male => (&self.male_pool, &mut self.male_count),
            GenderBucket::Female => (&self.female_pool, &mut self.female_count),
        };
        if pool.is_empty() {
            return None;
        }
        let idx = *count % pool.len();
        *count += 1;
        Some(pool[idx].clone())
    }

    /// Picks for `gender`, applying the "unknown alternates toward whichever pool has fewer
    /// assigned voices so far" rule, falling back to the other bucket if the preferred one is
    /// empty.
    pub fn pick(&mut self, gender: Gender) -> Option<VoiceId> {
        let primary = match gender {
            Gender::Male => GenderBucket::Male,
            Gender::Female => GenderBucket::Female,
            Gender::Unknown => {
                if self.male_count <= self.female_count {
                    GenderBucket::Male
                } else {
                    GenderBucket::Female
                }
            }
        };
        self.pick_bucket(primary).or_else(|| {
            let fallback = match primary {
                GenderBucket::Male => GenderBucket::Female,
                GenderBucket::Female => GenderBucket::Male,
            };
            self.pick_bucket(fallback)
        })
    }
}
