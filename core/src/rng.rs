//! Deterministic seed generation for simulator runs.
//!
//! RULE: The harness never hands the simulator a seed that did not come
//! from a SeedBank. Every year's seeds derive from the single master seed,
//! so a run can be replayed by passing the logged master seed back in.
//!
//! Each year gets its own stream, seeded from (master_seed XOR year).
//! This means:
//!   - Adding or removing a year never changes the other years' seeds.
//!   - A single year can be re-run in isolation with identical seeds.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::types::Year;

/// Seeds are drawn uniformly from [0, SEED_UPPER_BOUND).
pub const SEED_UPPER_BOUND: u64 = 10_000;

/// Simulator seed positions, in command-line order.
/// NEVER reorder. The simulator reads them positionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SeedSlot {
    Initiation = 0,
    Cessation = 1,
    OtherCauseOfDeath = 2,
    Individual = 3,
}

impl SeedSlot {
    pub const ALL: [SeedSlot; 4] = [
        Self::Initiation,
        Self::Cessation,
        Self::OtherCauseOfDeath,
        Self::Individual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Initiation        => "initiation",
            Self::Cessation         => "cessation",
            Self::OtherCauseOfDeath => "other_cod",
            Self::Individual        => "individual",
        }
    }
}

/// The four seeds passed to one simulator invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorSeeds {
    pub initiation: u64,
    pub cessation:  u64,
    pub other_cod:  u64,
    pub individual: u64,
}

impl SimulatorSeeds {
    pub fn get(&self, slot: SeedSlot) -> u64 {
        match slot {
            SeedSlot::Initiation        => self.initiation,
            SeedSlot::Cessation         => self.cessation,
            SeedSlot::OtherCauseOfDeath => self.other_cod,
            SeedSlot::Individual        => self.individual,
        }
    }

    /// Seeds in command-line order.
    pub fn as_array(&self) -> [u64; 4] {
        SeedSlot::ALL.map(|slot| self.get(slot))
    }
}

/// Source of per-year simulator seeds for a single harness run.
pub struct SeedBank {
    master_seed: u64,
}

impl SeedBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Bank with a master seed drawn from the OS. Log `master_seed()` to replay.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Draw the four seeds for `year`, in slot order.
    pub fn for_year(&self, year: Year) -> SimulatorSeeds {
        let derived_seed = self.master_seed ^ (year as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let mut rng = Pcg64Mcg::seed_from_u64(derived_seed);
        let mut draw = || rng.gen_range(0..SEED_UPPER_BOUND);
        SimulatorSeeds {
            initiation: draw(),
            cessation:  draw(),
            other_cod:  draw(),
            individual: draw(),
        }
    }
}
