//! smokehist-core: harness for the external smoking-history simulator.
//!
//! One pass per cohort year:
//!   1. input     — write N synthetic subjects
//!   2. simulator — launch the external executable with four seeds
//!   3. record    — parse the semicolon-delimited output
//!   4. report    — prevalence, age bands, smoking-history statistics
//!
//! harness.rs drives the loop; nothing here keeps state across years.

pub mod config;
pub mod error;
pub mod harness;
pub mod input;
pub mod record;
pub mod report;
pub mod rng;
pub mod simulator;
pub mod types;
