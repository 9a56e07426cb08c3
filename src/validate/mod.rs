//! Legality validation
//!
//! The rule layer between tokenization and execution: exclusivity,
//! required words, ranges, plane consistency, and extension hooks.

pub mod engine;

pub use engine::{Descriptor, validate};
