//! Interpreter status codes
//!
//! The closed set of outcomes one processed line can produce. Everything
//! raised by the tokenizer or the validator is detected before any state
//! mutation; `MotionRejected` and `Cancelled` are the two executor-level
//! outcomes and follow the commit rules documented in `exec`.

use thiserror::Error;

use crate::state::modal::ModalGroup;

/// Everything that can go wrong while processing one command line.
///
/// None of these is fatal: the caller discards the line and awaits the
/// next one.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    /// A word's numeric literal failed to parse.
    #[error("malformed number for word '{0}'")]
    NumericFormat(char),

    /// A well-formed word that neither the core tables nor any registered
    /// extension recognizes.
    #[error("unsupported word '{letter}{value}'")]
    UnsupportedWord { letter: char, value: f64 },

    /// Two codes from the same exclusive modal group on one line.
    #[error("conflicting codes in the {0} modal group")]
    ModalGroupConflict(ModalGroup),

    /// A selected code is missing one of its required words.
    #[error("missing required word: {0}")]
    MissingWord(&'static str),

    /// An over-specified word combination (e.g. both radius and center
    /// offsets for one arc, or the same word twice).
    #[error("conflicting words: {0}")]
    ConflictingWord(&'static str),

    /// A word's value is outside the machine's configured bounds.
    #[error("value out of range for word '{0}'")]
    OutOfRange(char),

    /// A word that no code on this line (or active modal state) consumes.
    #[error("word '{0}' is not applicable to this line")]
    InapplicableWord(char),

    /// An arc center-offset word that does not belong to the active plane.
    #[error("arc offset word '{0}' does not match the active plane")]
    PlaneMismatch(char),

    /// The motion layer refused a submitted motion. Modal state stays
    /// committed; see `exec` for the rationale.
    #[error("motion rejected by the planner")]
    MotionRejected,

    /// A reset or feed hold aborted the remaining steps of this line.
    #[error("cancelled by a real-time event")]
    Cancelled,
}
