//! Deterministic random number generation.
//!
//! RULE: Nothing in the crate may call any platform RNG.
//! All randomness flows through SlotRng instances derived
//! from the single master seed stored on the Run record.
//!
//! Each consumer gets its own stream per tick, seeded from
//! (master_seed, slot index, tick). This means:
//!   - Adding a new slot never changes existing streams.
//!   - A restored snapshot reproduces the same draws without
//!     carrying RNG state.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::types::Tick;

/// A named, deterministic RNG for a single slot.
pub struct SlotRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SlotRng {
    /// Create an RNG from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Fill a 16-byte buffer, e.g. for identifiers.
    pub fn next_bytes16(&mut self) -> [u8; 16] {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        self.inner.fill_bytes(&mut bytes);
        bytes
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// All RNG streams for a single run, indexed by stable slot.
#[derive(Debug, Clone)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_slot(&self, slot: RngSlot) -> SlotRng {
        SlotRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }

    /// Stream for one slot at one tick.
    pub fn for_slot_at_tick(&self, slot: RngSlot, tick: Tick) -> SlotRng {
        let seed = self.master_seed ^ tick.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        SlotRng::new(seed, slot as u64).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries; only append.
/// Reordering changes every slot's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    Naming   = 0,
    Identity = 1,
    Behavior = 2,
                  // Add new slots here, append only.
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Naming   => "naming",
            Self::Identity => "identity",
            Self::Behavior => "behavior",
        }
    }
}
