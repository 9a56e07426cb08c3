//! Validation engine
//!
//! Applies the RS274NGC legality rules to one tokenized block against the
//! current modal and run state. Validation has no observable side effect:
//! a rejected line leaves every persistent structure untouched and
//! reports exactly one specific error.

use crate::config::MachineConfig;
use crate::error::Error;
use crate::extension::ExtensionChain;
use crate::parser::tokenizer::{AxisCommand, Block};
use crate::parser::words::WordSet;
use crate::state::modal::{
    FeedRateMode, ModalGroup, ModalGroups, MotionMode, NonModal, ToolLengthMode,
};
use crate::state::run::RunState;

/// A validated, read-only execution descriptor: the block plus the
/// not-yet-committed candidate modal selections it carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Descriptor {
    pub(crate) block: Block,
}

impl Descriptor {
    pub fn block(&self) -> &Block {
        &self.block
    }
}

/// The motion that this line will actually dispatch, if any: axis words
/// must be present and must belong to a motion command (explicit on the
/// line, or the persisted modal motion mode).
pub(crate) fn pending_motion(block: &Block, modal: &ModalGroups) -> Option<MotionMode> {
    if !block.word_set.intersects(WordSet::AXES) {
        return None;
    }
    match block.axis_command {
        AxisCommand::Offset | AxisCommand::ToolLength => None,
        AxisCommand::Motion | AxisCommand::None => {
            match block.modes.motion.unwrap_or(modal.motion) {
                MotionMode::None | MotionMode::Canceled => None,
                mode => Some(mode),
            }
        }
    }
}

/// Validate one tokenized block. On success the returned descriptor is
/// ready for the executor; on failure nothing has changed anywhere.
pub fn validate(
    block: Block,
    modal: &ModalGroups,
    run: &RunState,
    config: &MachineConfig,
    chain: &ExtensionChain,
) -> Result<Descriptor, Error> {
    let ws = block.word_set;
    let has_axis = ws.intersects(WordSet::AXES);
    let pending = pending_motion(&block, modal);
    let feed_mode = block.modes.feed_rate.unwrap_or(modal.feed_rate);

    // 1. Exclusivity: at most one code per exclusive group, and at most
    // one command consuming the line's axis words.
    if let Some(group) = ModalGroup::from_set(block.conflicts) {
        return Err(Error::ModalGroupConflict(group));
    }
    if block.axis_conflict {
        return Err(Error::ModalGroupConflict(ModalGroup::Motion));
    }

    // 2. Required words.
    if let Some(motion) = block.modes.motion {
        if (motion.is_arc() || motion.is_probe()) && !has_axis {
            return Err(Error::MissingWord("axis word"));
        }
    }
    if let Some(motion) = pending {
        if motion.is_arc() {
            let has_radius = ws.intersects(WordSet::R);
            let has_offsets = ws.intersects(WordSet::ARC_OFFSETS);
            if has_radius && has_offsets {
                return Err(Error::ConflictingWord(
                    "both radius and center offsets given for one arc",
                ));
            }
            if !has_radius && !has_offsets {
                return Err(Error::MissingWord("R or center offset"));
            }
        }
        if motion.uses_feed() && !ws.intersects(WordSet::F) {
            // Inverse-time mode needs F on every feed motion line; units
            // per minute can fall back to the persisted feedrate.
            if feed_mode == FeedRateMode::InverseTime || run.feedrate <= 0.0 {
                return Err(Error::MissingWord("F"));
            }
        }
    }
    if block.modes.tool_length == Some(ToolLengthMode::Dynamic) {
        if !ws.intersects(WordSet::Z) {
            return Err(Error::MissingWord("Z"));
        }
        let extra = ws.and(WordSet::AXES).without(WordSet::Z);
        if let Some(letter) = extra.first_axis_letter() {
            return Err(Error::InapplicableWord(letter));
        }
    }
    match block.modes.nonmodal {
        NonModal::Dwell => {
            if !ws.intersects(WordSet::P) {
                return Err(Error::MissingWord("P"));
            }
        }
        NonModal::SetCoordinateData => {
            if !ws.intersects(WordSet::L) {
                return Err(Error::MissingWord("L"));
            }
            if !ws.intersects(WordSet::P) {
                return Err(Error::MissingWord("P"));
            }
        }
        NonModal::SetOffsets => {
            if !has_axis {
                return Err(Error::MissingWord("axis word"));
            }
        }
        NonModal::MachineCoords => {
            let motion = block.modes.motion.unwrap_or(modal.motion);
            if !matches!(motion, MotionMode::Rapid | MotionMode::Linear) {
                return Err(Error::ModalGroupConflict(ModalGroup::Motion));
            }
        }
        _ => {}
    }

    // 3. Ranges and applicability.
    if has_axis && block.axis_command == AxisCommand::None && pending.is_none() {
        // Axis words with nothing to consume them (motion canceled or
        // never selected).
        let letter = ws.first_axis_letter().unwrap_or('X');
        return Err(Error::InapplicableWord(letter));
    }
    if !block.extended {
        // Extensions validate their own claimed context; for pure core
        // lines every auxiliary word must have a consumer.
        let is_arc = pending.is_some_and(MotionMode::is_arc);
        if !is_arc {
            if let Some(letter) = ws.and(WordSet::ARC_OFFSETS).first_offset_letter() {
                return Err(Error::InapplicableWord(letter));
            }
            if ws.intersects(WordSet::R) {
                return Err(Error::InapplicableWord('R'));
            }
        }
        if ws.intersects(WordSet::D) {
            return Err(Error::InapplicableWord('D'));
        }
        if ws.intersects(WordSet::L) && block.modes.nonmodal != NonModal::SetCoordinateData {
            return Err(Error::InapplicableWord('L'));
        }
        if ws.intersects(WordSet::P)
            && !matches!(
                block.modes.nonmodal,
                NonModal::Dwell | NonModal::SetCoordinateData
            )
        {
            return Err(Error::InapplicableWord('P'));
        }
    }
    if ws.intersects(WordSet::F) && block.words.f <= 0.0 {
        return Err(Error::OutOfRange('F'));
    }
    if ws.intersects(WordSet::S) {
        if block.words.s < 0.0 {
            return Err(Error::OutOfRange('S'));
        }
        if let Some(max) = config.spindle_max_rpm {
            if block.words.s > max {
                return Err(Error::OutOfRange('S'));
            }
        }
    }
    if ws.intersects(WordSet::T) {
        let t = block.words.t;
        if t < 0.0 || t.fract() != 0.0 || t > config.tool_count as f64 {
            return Err(Error::OutOfRange('T'));
        }
    }
    if let Some(index) = block.modes.coord_system {
        if index as usize >= config.coord_system_count {
            return Err(Error::OutOfRange('G'));
        }
    }
    match block.modes.nonmodal {
        NonModal::Dwell => {
            if block.words.p < 0.0 {
                return Err(Error::OutOfRange('P'));
            }
        }
        NonModal::SetCoordinateData => {
            if block.words.l != 2.0 {
                return Err(Error::OutOfRange('L'));
            }
            let p = block.words.p;
            if p < 0.0 || p.fract() != 0.0 || p > config.coord_system_count as f64 {
                return Err(Error::OutOfRange('P'));
            }
        }
        _ => {}
    }

    // 4. Plane consistency: arc center offsets must belong to the two
    // axes of the active (or just-selected) plane.
    if pending.is_some_and(MotionMode::is_arc) {
        let plane = block.modes.plane.unwrap_or(modal.plane);
        let stray = ws.and(WordSet::ARC_OFFSETS).without(plane.offset_words());
        if let Some(letter) = stray.first_offset_letter() {
            return Err(Error::PlaneMismatch(letter));
        }
    }

    // 5. Extension checks for claimed words.
    chain.validate(&block, modal)?;

    Ok(Descriptor { block })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenize;

    fn check(line: &str) -> Result<Descriptor, Error> {
        check_with(line, &ModalGroups::default(), &RunState::default())
    }

    fn check_with(line: &str, modal: &ModalGroups, run: &RunState) -> Result<Descriptor, Error> {
        let mut chain = ExtensionChain::new();
        let block = tokenize(line, &mut chain).unwrap();
        validate(
            block,
            modal,
            run,
            &MachineConfig::default(),
            &chain,
        )
    }

    #[test]
    fn test_motion_group_conflict() {
        assert_eq!(
            check("G0 G1 X1"),
            Err(Error::ModalGroupConflict(ModalGroup::Motion))
        );
    }

    #[test]
    fn test_axis_claim_conflict() {
        assert_eq!(
            check("G1 G92 X1 F100"),
            Err(Error::ModalGroupConflict(ModalGroup::Motion))
        );
    }

    #[test]
    fn test_linear_needs_feedrate() {
        assert_eq!(check("G1 X1"), Err(Error::MissingWord("F")));
        assert!(check("G1 X1 F100").is_ok());

        // A persisted feedrate satisfies later lines.
        let run = RunState {
            feedrate: 200.0,
            ..RunState::default()
        };
        assert!(check_with("G1 X1", &ModalGroups::default(), &run).is_ok());
    }

    #[test]
    fn test_inverse_time_needs_feed_every_line() {
        let modal = ModalGroups {
            feed_rate: FeedRateMode::InverseTime,
            motion: MotionMode::Linear,
            ..ModalGroups::default()
        };
        let run = RunState {
            feedrate: 200.0,
            ..RunState::default()
        };
        assert_eq!(
            check_with("X5", &modal, &run),
            Err(Error::MissingWord("F"))
        );
    }

    #[test]
    fn test_arc_requires_radius_or_offsets() {
        assert_eq!(
            check("G2 X10 Y10 F50"),
            Err(Error::MissingWord("R or center offset"))
        );
        assert!(check("G2 X10 Y10 I5 F50").is_ok());
        assert!(check("G2 X10 Y10 R7 F50").is_ok());
        assert_eq!(
            check("G2 X10 Y10 R7 I5 F50"),
            Err(Error::ConflictingWord(
                "both radius and center offsets given for one arc"
            ))
        );
    }

    #[test]
    fn test_arc_offsets_must_match_plane() {
        assert_eq!(check("G2 X1 Y1 K3 F50"), Err(Error::PlaneMismatch('K')));
        assert_eq!(check("G19 G2 Y1 Z1 I3 F50"), Err(Error::PlaneMismatch('I')));
        assert!(check("G18 G2 X1 Z1 K3 F50").is_ok());
    }

    #[test]
    fn test_axis_words_need_a_consumer() {
        assert_eq!(check("X5"), Err(Error::InapplicableWord('X')));
        assert_eq!(check("G80 Y5"), Err(Error::InapplicableWord('Y')));
    }

    #[test]
    fn test_stray_auxiliary_words() {
        assert_eq!(check("G1 X1 I2 F100"), Err(Error::InapplicableWord('I')));
        assert_eq!(check("G0 X1 L2"), Err(Error::InapplicableWord('L')));
        assert_eq!(check("G1 X1 D3 F100"), Err(Error::InapplicableWord('D')));
    }

    #[test]
    fn test_dwell_needs_nonnegative_p() {
        assert_eq!(check("G4"), Err(Error::MissingWord("P")));
        assert_eq!(check("G4 P-1"), Err(Error::OutOfRange('P')));
        assert!(check("G4 P0.5").is_ok());
    }

    #[test]
    fn test_g10_word_rules() {
        assert_eq!(check("G10 P1 X1"), Err(Error::MissingWord("L")));
        assert_eq!(check("G10 L2 X1"), Err(Error::MissingWord("P")));
        assert_eq!(check("G10 L20 P1 X1"), Err(Error::OutOfRange('L')));
        assert_eq!(check("G10 L2 P12 X1"), Err(Error::OutOfRange('P')));
        assert!(check("G10 L2 P3 X5 Y5").is_ok());
    }

    #[test]
    fn test_tool_and_spindle_ranges() {
        assert_eq!(check("T40"), Err(Error::OutOfRange('T')));
        assert_eq!(check("T1.5"), Err(Error::OutOfRange('T')));
        assert!(check("T3").is_ok());
        assert_eq!(check("S-100"), Err(Error::OutOfRange('S')));

        let config = MachineConfig {
            spindle_max_rpm: Some(1000.0),
            ..MachineConfig::default()
        };
        let mut chain = ExtensionChain::new();
        let block = tokenize("S2000", &mut chain).unwrap();
        assert_eq!(
            validate(
                block,
                &ModalGroups::default(),
                &RunState::default(),
                &config,
                &chain,
            ),
            Err(Error::OutOfRange('S'))
        );
    }

    #[test]
    fn test_coord_system_range() {
        // Default table has six systems; G59.1 addresses the seventh.
        assert_eq!(check("G59.1"), Err(Error::OutOfRange('G')));
        assert!(check("G59").is_ok());
    }

    #[test]
    fn test_g53_requires_linear_or_rapid() {
        assert_eq!(
            check("G53 G2 X1 I1 F100"),
            Err(Error::ModalGroupConflict(ModalGroup::Motion))
        );
        assert!(check("G53 G0 X1").is_ok());
    }

    #[test]
    fn test_tlo_word_rules() {
        assert_eq!(check("G43.1"), Err(Error::MissingWord("Z")));
        assert_eq!(check("G43.1 Z1 X2"), Err(Error::InapplicableWord('X')));
        assert!(check("G43.1 Z2.5").is_ok());
    }

    #[test]
    fn test_g92_needs_axis_words() {
        assert_eq!(check("G92"), Err(Error::MissingWord("axis word")));
        assert!(check("G92 X0 Y0").is_ok());
    }
}
