//! GCode tokenization
//!
//! Fast, single-pass conversion of one command line into a word value
//! record plus word- and group-selection masks. Pure data tables live in
//! `words`; the line walk lives in `tokenizer`.

pub mod tokenizer;
pub mod words;

pub use tokenizer::{AxisCommand, Block, CandidateModes, WordValues, tokenize};
pub use words::{AXIS_COUNT, Axes, GroupSet, WordSet};
