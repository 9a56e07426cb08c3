//! GCode tokenizer
//!
//! Converts one command line into a word value record plus word- and
//! group-selection masks. Fast, single-pass, minimal allocations. Pure
//! with respect to persistent state: the only context it consults is the
//! extension chain, for words the core tables reject.

use crate::error::Error;
use crate::extension::{Claim, ExtensionChain};
use crate::parser::words::{self, Axes, GroupSet, WordSet};
use crate::state::modal::{
    CoolantMode, CutterComp, DistanceMode, FeedRateMode, MotionMode, NonModal, OverrideMode,
    PathMode, Plane, RetractMode, SpindleMode, Stopping, ToolLengthMode, Units,
};

/// Per-line numeric values for each recognized word letter. Exists only
/// for the duration of one line's processing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WordValues {
    pub xyzabc: Axes,
    pub ijk: [f64; 3],
    pub d: f64,
    pub f: f64,
    pub l: f64,
    pub p: f64,
    pub r: f64,
    pub s: f64,
    pub t: f64,
    /// Line number from an N word.
    pub n: Option<u32>,
}

/// Candidate modal selections for one line. `None` leaves that group
/// untouched; nothing here is committed until the executor runs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CandidateModes {
    pub motion: Option<MotionMode>,
    pub plane: Option<Plane>,
    pub distance: Option<DistanceMode>,
    pub feed_rate: Option<FeedRateMode>,
    pub units: Option<Units>,
    pub cutter_comp: Option<CutterComp>,
    pub tool_length: Option<ToolLengthMode>,
    pub retract: Option<RetractMode>,
    pub coord_system: Option<u8>,
    pub path: Option<PathMode>,
    pub stopping: Option<Stopping>,
    pub spindle: Option<SpindleMode>,
    pub coolant: Option<CoolantMode>,
    pub feed_override: Option<OverrideMode>,
    /// Transient; applies to this line only.
    pub nonmodal: NonModal,
}

/// Which command on this line consumes the axis words: a motion target,
/// an offset-setting non-modal, or the dynamic tool length offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisCommand {
    #[default]
    None,
    Motion,
    Offset,
    ToolLength,
}

/// Tokenizer output for one line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Block {
    pub words: WordValues,
    /// Letters seen on this line.
    pub word_set: WordSet,
    /// Groups selected on this line.
    pub groups: GroupSet,
    /// Groups selected more than once; reported by the validator.
    pub conflicts: GroupSet,
    /// True when two different commands both tried to consume the axis
    /// words (e.g. G1 and G92 on one line).
    pub axis_conflict: bool,
    /// Role of this line's axis words.
    pub axis_command: AxisCommand,
    pub modes: CandidateModes,
    /// At least one word was claimed by a parser extension.
    pub extended: bool,
}

impl Block {
    /// Record a group selection, flagging re-selection of an exclusive
    /// group.
    pub fn select_group(&mut self, group: GroupSet) {
        if self.groups.has(group) {
            self.conflicts.insert(group);
        }
        self.groups.insert(group);
    }

    fn claim_axes(&mut self, claim: AxisCommand) {
        if self.axis_command != AxisCommand::None && self.axis_command != claim {
            self.axis_conflict = true;
        }
        self.axis_command = claim;
    }

    fn set_motion(&mut self, mode: MotionMode) {
        self.select_group(GroupSet::MOTION);
        self.modes.motion = Some(mode);
        if mode != MotionMode::Canceled {
            self.claim_axes(AxisCommand::Motion);
        }
    }

    fn set_nonmodal(&mut self, nonmodal: NonModal) {
        self.select_group(GroupSet::NONMODAL);
        self.modes.nonmodal = nonmodal;
        if nonmodal.uses_axis_words() {
            self.claim_axes(AxisCommand::Offset);
        }
    }
}

/// Tokenize one command line. Letters are case-insensitive; whitespace is
/// skipped; `;` and parenthetical comments are stripped.
pub fn tokenize(line: &str, chain: &mut ExtensionChain) -> Result<Block, Error> {
    let mut block = Block::default();
    let mut chars = line.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        match ch {
            ' ' | '\t' | '\r' | '\n' => continue,
            // Semicolon comment runs to the end of the line.
            ';' => break,
            '(' => {
                for (_, c) in chars.by_ref() {
                    if c == ')' {
                        break;
                    }
                }
            }
            c if c.is_ascii_alphabetic() => {
                let letter = c.to_ascii_uppercase();
                let value = scan_number(line, &mut chars).ok_or(Error::NumericFormat(letter))?;
                apply_word(&mut block, letter, value, chain)?;
            }
            other => {
                // Junk characters are unrecognized words.
                return Err(Error::UnsupportedWord {
                    letter: other,
                    value: 0.0,
                });
            }
        }
    }

    Ok(block)
}

/// Scan the signed decimal literal following a word letter.
fn scan_number(
    line: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Option<f64> {
    let start = chars.peek().map(|&(idx, _)| idx)?;
    let mut end = start;
    let mut first = true;
    while let Some(&(idx, c)) = chars.peek() {
        let is_sign = first && (c == '+' || c == '-');
        if c.is_ascii_digit() || c == '.' || is_sign {
            end = idx + c.len_utf8();
            chars.next();
            first = false;
        } else {
            break;
        }
    }
    if end == start {
        return None;
    }
    line[start..end].parse::<f64>().ok()
}

fn apply_word(
    block: &mut Block,
    letter: char,
    value: f64,
    chain: &mut ExtensionChain,
) -> Result<(), Error> {
    match letter {
        'G' => apply_gcode(block, letter, value, chain),
        'M' => apply_mcode(block, letter, value, chain),
        'N' => {
            if value < 0.0 || value.fract() != 0.0 {
                return Err(Error::NumericFormat('N'));
            }
            block.words.n = Some(value as u32);
            Ok(())
        }
        _ => apply_value_word(block, letter, value, chain),
    }
}

fn apply_value_word(
    block: &mut Block,
    letter: char,
    value: f64,
    chain: &mut ExtensionChain,
) -> Result<(), Error> {
    let (bit, slot) = if let Some(axis) = words::axis_index(letter) {
        (WordSet::axis(axis), &mut block.words.xyzabc[axis])
    } else if let Some(offset) = words::offset_index(letter) {
        (WordSet::offset(offset), &mut block.words.ijk[offset])
    } else {
        let (bit, slot) = match letter {
            'D' => (WordSet::D, &mut block.words.d),
            'F' => (WordSet::F, &mut block.words.f),
            'L' => (WordSet::L, &mut block.words.l),
            'P' => (WordSet::P, &mut block.words.p),
            'R' => (WordSet::R, &mut block.words.r),
            'S' => (WordSet::S, &mut block.words.s),
            'T' => (WordSet::T, &mut block.words.t),
            _ => return offer_to_chain(block, letter, value, chain),
        };
        (bit, slot)
    };

    if block.word_set.intersects(bit) {
        return Err(Error::ConflictingWord("word repeated on line"));
    }
    *slot = value;
    block.word_set.insert(bit);
    Ok(())
}

fn apply_gcode(
    block: &mut Block,
    letter: char,
    value: f64,
    chain: &mut ExtensionChain,
) -> Result<(), Error> {
    let Some((code, tenth)) = split_code(value) else {
        return Err(Error::NumericFormat('G'));
    };
    match (code, tenth) {
        (0, 0) => block.set_motion(MotionMode::Rapid),
        (1, 0) => block.set_motion(MotionMode::Linear),
        (2, 0) => block.set_motion(MotionMode::CwArc),
        (3, 0) => block.set_motion(MotionMode::CcwArc),
        (38, 2) => block.set_motion(MotionMode::ProbeToward),
        (38, 3) => block.set_motion(MotionMode::ProbeTowardNoError),
        (38, 4) => block.set_motion(MotionMode::ProbeAway),
        (38, 5) => block.set_motion(MotionMode::ProbeAwayNoError),
        (80, 0) => block.set_motion(MotionMode::Canceled),
        (17, 0) => select_plane(block, Plane::Xy),
        (18, 0) => select_plane(block, Plane::Zx),
        (19, 0) => select_plane(block, Plane::Yz),
        (90, 0) => select_distance(block, DistanceMode::Absolute),
        (91, 0) => select_distance(block, DistanceMode::Incremental),
        (93, 0) => select_feed_rate(block, FeedRateMode::InverseTime),
        (94, 0) => select_feed_rate(block, FeedRateMode::UnitsPerMinute),
        (20, 0) => select_units(block, Units::Inches),
        (21, 0) => select_units(block, Units::Millimeters),
        (40, 0) => {
            block.select_group(GroupSet::CUTTER_COMP);
            block.modes.cutter_comp = Some(CutterComp::Off);
        }
        (43, 1) => {
            block.select_group(GroupSet::TOOL_LENGTH);
            block.modes.tool_length = Some(ToolLengthMode::Dynamic);
            block.claim_axes(AxisCommand::ToolLength);
        }
        (49, 0) => {
            block.select_group(GroupSet::TOOL_LENGTH);
            block.modes.tool_length = Some(ToolLengthMode::None);
        }
        (98, 0) => select_retract(block, RetractMode::InitialPoint),
        (99, 0) => select_retract(block, RetractMode::RPoint),
        (54..=59, 0) => select_coord_system(block, (code - 54) as u8),
        (59, 1..=3) => select_coord_system(block, 5 + tenth),
        (61, 0) => select_path(block, PathMode::ExactPath),
        (64, 0) => select_path(block, PathMode::Continuous),
        (4, 0) => block.set_nonmodal(NonModal::Dwell),
        (10, 0) => block.set_nonmodal(NonModal::SetCoordinateData),
        (28, 0) => block.set_nonmodal(NonModal::GoHome),
        (30, 0) => block.set_nonmodal(NonModal::GoHomeAlt),
        (53, 0) => block.set_nonmodal(NonModal::MachineCoords),
        (92, 0) => block.set_nonmodal(NonModal::SetOffsets),
        (92, 1) => block.set_nonmodal(NonModal::ClearOffsets),
        _ => return offer_to_chain(block, letter, value, chain),
    }
    Ok(())
}

fn apply_mcode(
    block: &mut Block,
    letter: char,
    value: f64,
    chain: &mut ExtensionChain,
) -> Result<(), Error> {
    let Some((code, 0)) = split_code(value) else {
        return offer_to_chain(block, letter, value, chain);
    };
    match code {
        0 => select_stopping(block, Stopping::Pause),
        1 => select_stopping(block, Stopping::OptionalPause),
        2 => select_stopping(block, Stopping::End),
        30 => select_stopping(block, Stopping::EndRewind),
        3 => select_spindle(block, SpindleMode::Clockwise),
        4 => select_spindle(block, SpindleMode::CounterClockwise),
        5 => select_spindle(block, SpindleMode::Off),
        6 => block.select_group(GroupSet::TOOL_CHANGE),
        7 => select_coolant(block, CoolantMode::Mist),
        8 => select_coolant(block, CoolantMode::Flood),
        9 => select_coolant(block, CoolantMode::Off),
        48 => select_override(block, OverrideMode::Enabled),
        49 => select_override(block, OverrideMode::Disabled),
        _ => return offer_to_chain(block, letter, value, chain),
    }
    Ok(())
}

/// Split a code number into its integer part and decimal tenth
/// (38.2 → (38, 2)). Codes with finer fractions are not core codes.
fn split_code(value: f64) -> Option<(u16, u8)> {
    if value < 0.0 {
        return None;
    }
    let scaled = (value * 10.0).round();
    if (value * 10.0 - scaled).abs() > 1e-6 || scaled > u16::MAX as f64 {
        return None;
    }
    let scaled = scaled as u16;
    Some((scaled / 10, (scaled % 10) as u8))
}

fn offer_to_chain(
    block: &mut Block,
    letter: char,
    value: f64,
    chain: &mut ExtensionChain,
) -> Result<(), Error> {
    match chain.offer_word(letter, value, block)? {
        Claim::Claimed => {
            block.extended = true;
            Ok(())
        }
        Claim::Pass => Err(Error::UnsupportedWord { letter, value }),
    }
}

fn select_plane(block: &mut Block, plane: Plane) {
    block.select_group(GroupSet::PLANE);
    block.modes.plane = Some(plane);
}

fn select_distance(block: &mut Block, mode: DistanceMode) {
    block.select_group(GroupSet::DISTANCE);
    block.modes.distance = Some(mode);
}

fn select_feed_rate(block: &mut Block, mode: FeedRateMode) {
    block.select_group(GroupSet::FEED_RATE);
    block.modes.feed_rate = Some(mode);
}

fn select_units(block: &mut Block, units: Units) {
    block.select_group(GroupSet::UNITS);
    block.modes.units = Some(units);
}

fn select_retract(block: &mut Block, mode: RetractMode) {
    block.select_group(GroupSet::RETRACT);
    block.modes.retract = Some(mode);
}

fn select_coord_system(block: &mut Block, index: u8) {
    block.select_group(GroupSet::COORD_SYSTEM);
    block.modes.coord_system = Some(index);
}

fn select_path(block: &mut Block, mode: PathMode) {
    block.select_group(GroupSet::PATH);
    block.modes.path = Some(mode);
}

fn select_stopping(block: &mut Block, mode: Stopping) {
    block.select_group(GroupSet::STOPPING);
    block.modes.stopping = Some(mode);
}

fn select_spindle(block: &mut Block, mode: SpindleMode) {
    block.select_group(GroupSet::SPINDLE);
    block.modes.spindle = Some(mode);
}

fn select_coolant(block: &mut Block, mode: CoolantMode) {
    block.select_group(GroupSet::COOLANT);
    block.modes.coolant = Some(mode);
}

fn select_override(block: &mut Block, mode: OverrideMode) {
    block.select_group(GroupSet::OVERRIDE);
    block.modes.feed_override = Some(mode);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_line(line: &str) -> Result<Block, Error> {
        tokenize(line, &mut ExtensionChain::new())
    }

    #[test]
    fn test_tokenize_simple_motion() {
        let block = tokenize_line("G1 X10 Y5 F200").unwrap();
        assert_eq!(block.modes.motion, Some(MotionMode::Linear));
        assert_eq!(block.words.xyzabc[0], 10.0);
        assert_eq!(block.words.xyzabc[1], 5.0);
        assert_eq!(block.words.f, 200.0);
        assert!(block.word_set.intersects(WordSet::F));
        assert_eq!(block.axis_command, AxisCommand::Motion);
        assert!(block.conflicts.is_empty());
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let a = tokenize_line("G1 X10 Y5 F200").unwrap();
        let b = tokenize_line("G1 X10 Y5 F200").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tokenize_case_insensitive_and_compact() {
        let spaced = tokenize_line("G1 X10 Y-2.5").unwrap();
        let compact = tokenize_line("g1x10y-2.5").unwrap();
        assert_eq!(spaced, compact);
    }

    #[test]
    fn test_tokenize_strips_comments() {
        let block = tokenize_line("G0 (rapid move) X1 ; to the fixture").unwrap();
        assert_eq!(block.modes.motion, Some(MotionMode::Rapid));
        assert_eq!(block.words.xyzabc[0], 1.0);
        assert!(!block.word_set.intersects(WordSet::F));
    }

    #[test]
    fn test_tokenize_decimal_codes() {
        let block = tokenize_line("G38.2 Z-5 F10").unwrap();
        assert_eq!(block.modes.motion, Some(MotionMode::ProbeToward));

        let block = tokenize_line("G43.1 Z2.5").unwrap();
        assert_eq!(block.modes.tool_length, Some(ToolLengthMode::Dynamic));
        assert_eq!(block.axis_command, AxisCommand::ToolLength);

        let block = tokenize_line("G59.3").unwrap();
        assert_eq!(block.modes.coord_system, Some(8));
    }

    #[test]
    fn test_tokenize_flags_group_reselection() {
        let block = tokenize_line("G0 G1 X1").unwrap();
        assert!(block.conflicts.has(GroupSet::MOTION));

        let block = tokenize_line("G17 G19").unwrap();
        assert!(block.conflicts.has(GroupSet::PLANE));
    }

    #[test]
    fn test_tokenize_flags_axis_claim_clash() {
        let block = tokenize_line("G1 G92 X1").unwrap();
        assert!(block.axis_conflict);
    }

    #[test]
    fn test_tokenize_rejects_bad_numbers() {
        assert_eq!(tokenize_line("G1 X10..5"), Err(Error::NumericFormat('X')));
        assert_eq!(tokenize_line("G1 X"), Err(Error::NumericFormat('X')));
        assert_eq!(tokenize_line("N-2 G0"), Err(Error::NumericFormat('N')));
    }

    #[test]
    fn test_tokenize_rejects_unknown_words() {
        assert_eq!(
            tokenize_line("G1 E5"),
            Err(Error::UnsupportedWord {
                letter: 'E',
                value: 5.0
            })
        );
        assert_eq!(
            tokenize_line("G41 X1"),
            Err(Error::UnsupportedWord {
                letter: 'G',
                value: 41.0
            })
        );
    }

    #[test]
    fn test_tokenize_rejects_repeated_words() {
        assert_eq!(
            tokenize_line("G1 X1 X2"),
            Err(Error::ConflictingWord("word repeated on line"))
        );
    }

    #[test]
    fn test_tokenize_line_number() {
        let block = tokenize_line("N120 G0 X1").unwrap();
        assert_eq!(block.words.n, Some(120));
    }

    #[test]
    fn test_tokenize_nonmodal_selection() {
        let block = tokenize_line("G10 L2 P3 X5 Y5").unwrap();
        assert_eq!(block.modes.nonmodal, NonModal::SetCoordinateData);
        assert_eq!(block.axis_command, AxisCommand::Offset);
        assert_eq!(block.words.l, 2.0);
        assert_eq!(block.words.p, 3.0);
    }

    #[test]
    fn test_split_code() {
        assert_eq!(split_code(38.2), Some((38, 2)));
        assert_eq!(split_code(92.1), Some((92, 1)));
        assert_eq!(split_code(5.0), Some((5, 0)));
        assert_eq!(split_code(38.25), None);
        assert_eq!(split_code(-1.0), None);
    }

    #[test]
    fn test_tokenize_empty_and_comment_only() {
        let block = tokenize_line("   ").unwrap();
        assert!(block.word_set.is_empty());
        let block = tokenize_line("; just a note").unwrap();
        assert!(block.groups.is_empty());
    }
}
