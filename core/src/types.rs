//! Shared primitive types used across the harness.

/// A calendar year (birth cohort, cutoff).
pub type Year = i32;

/// An age in whole years, as emitted by the simulator.
pub type Age = i32;

/// Category code for race or sex. 0 = all races / male.
pub type Code = u8;

/// Marker for "event did not occur / not applicable".
pub const SENTINEL: Age = -999;

/// Cut-off year built into the simulator. A requested cutoff is clamped to it.
pub const SIMULATOR_CUTOFF_YEAR: Year = 2050;
