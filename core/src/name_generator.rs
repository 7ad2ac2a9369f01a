//! Deterministic creep name generation.
//!
//! Used when `spawn_creep` is submitted without a name. Names are drawn
//! from a curated list plus a numeric suffix; collisions are retried
//! against the caller's view of taken names.

use crate::rng::SlotRng;

/// Deterministic name generator using a curated name list.
pub struct NameGenerator;

impl NameGenerator {
    /// Give up on the suffixed form after this many collisions.
    const MAX_ATTEMPTS: u32 = 64;

    /// Generate a creep name such as `Harper417`.
    pub fn generate_creep_name(rng: &mut SlotRng) -> String {
        let names = Self::base_names();
        let index = rng.next_u64_below(names.len() as u64) as usize;
        let suffix = rng.next_u64_below(1000);
        format!("{}{}", names[index], suffix)
    }

    /// Generate a name for which `is_taken` returns false.
    pub fn generate_unique(rng: &mut SlotRng, is_taken: impl Fn(&str) -> bool) -> String {
        for _ in 0..Self::MAX_ATTEMPTS {
            let name = Self::generate_creep_name(rng);
            if !is_taken(&name) {
                return name;
            }
        }
        // Fall back to the raw 64-bit draw, which cannot realistically collide.
        format!("creep-{:016x}", rng.next_u64())
    }

    fn base_names() -> &'static [&'static str] {
        &[
            "Aiden", "Amelia", "Arlo", "Aurora", "Beckett", "Briar", "Caleb", "Cora",
            "Dalia", "Declan", "Eden", "Elias", "Ember", "Ezra", "Fern", "Finn",
            "Gemma", "Gideon", "Hazel", "Harper", "Idris", "Iris", "Jasper", "Juno",
            "Kai", "Kira", "Leo", "Luna", "Milo", "Mira", "Nico", "Nova",
            "Oren", "Opal", "Pax", "Piper", "Quinn", "Reid", "Rowan", "Sage",
            "Silas", "Skye", "Theo", "Tess", "Uma", "Vale", "Wren", "Zane",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, RngSlot};

    #[test]
    fn name_generation_is_deterministic() {
        let mut rng1 = RngBank::new(12345).for_slot_at_tick(RngSlot::Naming, 1);
        let mut rng2 = RngBank::new(12345).for_slot_at_tick(RngSlot::Naming, 1);

        let name1 = NameGenerator::generate_creep_name(&mut rng1);
        let name2 = NameGenerator::generate_creep_name(&mut rng2);

        assert_eq!(name1, name2, "Same seed should produce same name");
    }

    #[test]
    fn generated_names_avoid_taken_ones() {
        let mut probe = RngBank::new(99).for_slot_at_tick(RngSlot::Naming, 3);
        let first = NameGenerator::generate_creep_name(&mut probe);

        let mut rng = RngBank::new(99).for_slot_at_tick(RngSlot::Naming, 3);
        let name = NameGenerator::generate_unique(&mut rng, |n| n == first);

        assert_ne!(name, first);
        assert!(!name.is_empty());
    }
}
