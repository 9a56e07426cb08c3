//! Modal group state
//!
//! The cross-line persistent selections of the RS274NGC modal groups.
//! One enum per exclusive group keeps the "one active choice at a time"
//! invariant in the type system; the transient non-modal selection never
//! survives the line it appeared on.

use std::fmt;

use crate::parser::words::{GroupSet, WordSet};

/// Caller-facing identifier for a modal or non-modal group, used when an
/// error names the group it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalGroup {
    Motion,
    Plane,
    Distance,
    FeedRate,
    Units,
    CutterComp,
    ToolLength,
    Retract,
    CoordSystem,
    Path,
    Stopping,
    ToolChange,
    Spindle,
    Coolant,
    Override,
    NonModal,
}

impl ModalGroup {
    /// Identifier for the lowest group bit set in `set`.
    pub(crate) fn from_set(set: GroupSet) -> Option<ModalGroup> {
        let first = set.first()?;
        let group = match first {
            g if g == GroupSet::MOTION => ModalGroup::Motion,
            g if g == GroupSet::PLANE => ModalGroup::Plane,
            g if g == GroupSet::DISTANCE => ModalGroup::Distance,
            g if g == GroupSet::FEED_RATE => ModalGroup::FeedRate,
            g if g == GroupSet::UNITS => ModalGroup::Units,
            g if g == GroupSet::CUTTER_COMP => ModalGroup::CutterComp,
            g if g == GroupSet::TOOL_LENGTH => ModalGroup::ToolLength,
            g if g == GroupSet::RETRACT => ModalGroup::Retract,
            g if g == GroupSet::COORD_SYSTEM => ModalGroup::CoordSystem,
            g if g == GroupSet::PATH => ModalGroup::Path,
            g if g == GroupSet::STOPPING => ModalGroup::Stopping,
            g if g == GroupSet::TOOL_CHANGE => ModalGroup::ToolChange,
            g if g == GroupSet::SPINDLE => ModalGroup::Spindle,
            g if g == GroupSet::COOLANT => ModalGroup::Coolant,
            g if g == GroupSet::OVERRIDE => ModalGroup::Override,
            _ => ModalGroup::NonModal,
        };
        Some(group)
    }
}

impl fmt::Display for ModalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModalGroup::Motion => "motion",
            ModalGroup::Plane => "plane selection",
            ModalGroup::Distance => "distance mode",
            ModalGroup::FeedRate => "feed rate mode",
            ModalGroup::Units => "units",
            ModalGroup::CutterComp => "cutter radius compensation",
            ModalGroup::ToolLength => "tool length offset",
            ModalGroup::Retract => "retract mode",
            ModalGroup::CoordSystem => "coordinate system",
            ModalGroup::Path => "path control",
            ModalGroup::Stopping => "stopping",
            ModalGroup::ToolChange => "tool change",
            ModalGroup::Spindle => "spindle",
            ModalGroup::Coolant => "coolant",
            ModalGroup::Override => "override enable",
            ModalGroup::NonModal => "non-modal",
        };
        f.write_str(name)
    }
}

/// Motion group (group 1): G0, G1, G2, G3, G38.2-G38.5, G80.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    /// Power-on state: no motion mode has been selected yet.
    #[default]
    None,
    Rapid,
    Linear,
    CwArc,
    CcwArc,
    /// G38.2: probe toward the workpiece, error on no contact.
    ProbeToward,
    /// G38.3: probe toward the workpiece, no error on no contact.
    ProbeTowardNoError,
    /// G38.4: probe away from the workpiece, error on loss of contact.
    ProbeAway,
    /// G38.5: probe away from the workpiece, no error on loss of contact.
    ProbeAwayNoError,
    /// G80: motion canceled; axis words are an error.
    Canceled,
}

impl MotionMode {
    pub fn is_arc(self) -> bool {
        matches!(self, MotionMode::CwArc | MotionMode::CcwArc)
    }

    pub fn is_probe(self) -> bool {
        matches!(
            self,
            MotionMode::ProbeToward
                | MotionMode::ProbeTowardNoError
                | MotionMode::ProbeAway
                | MotionMode::ProbeAwayNoError
        )
    }

    /// Probes that signal an error when they complete without triggering.
    pub fn probe_requires_trigger(self) -> bool {
        matches!(self, MotionMode::ProbeToward | MotionMode::ProbeAway)
    }

    pub fn probe_away(self) -> bool {
        matches!(self, MotionMode::ProbeAway | MotionMode::ProbeAwayNoError)
    }

    /// Feed motions need a feedrate; rapids do not.
    pub fn uses_feed(self) -> bool {
        self.is_arc() || self.is_probe() || self == MotionMode::Linear
    }

    pub fn code(self) -> &'static str {
        match self {
            MotionMode::Rapid => "G0",
            MotionMode::Linear => "G1",
            MotionMode::CwArc => "G2",
            MotionMode::CcwArc => "G3",
            MotionMode::ProbeToward => "G38.2",
            MotionMode::ProbeTowardNoError => "G38.3",
            MotionMode::ProbeAway => "G38.4",
            MotionMode::ProbeAwayNoError => "G38.5",
            MotionMode::None | MotionMode::Canceled => "G80",
        }
    }
}

/// Plane selection group (group 2): G17, G18, G19.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plane {
    #[default]
    Xy,
    Zx,
    Yz,
}

impl Plane {
    /// The two arc center-offset words valid in this plane.
    pub fn offset_words(self) -> WordSet {
        match self {
            Plane::Xy => {
                let mut set = WordSet::I;
                set.insert(WordSet::J);
                set
            }
            Plane::Zx => {
                let mut set = WordSet::I;
                set.insert(WordSet::K);
                set
            }
            Plane::Yz => {
                let mut set = WordSet::J;
                set.insert(WordSet::K);
                set
            }
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Plane::Xy => "G17",
            Plane::Zx => "G18",
            Plane::Yz => "G19",
        }
    }
}

/// Distance mode group (group 3): G90, G91.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMode {
    #[default]
    Absolute,
    Incremental,
}

impl DistanceMode {
    pub fn code(self) -> &'static str {
        match self {
            DistanceMode::Absolute => "G90",
            DistanceMode::Incremental => "G91",
        }
    }
}

/// Feed rate mode group (group 5): G93, G94.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedRateMode {
    InverseTime,
    #[default]
    UnitsPerMinute,
}

impl FeedRateMode {
    pub fn code(self) -> &'static str {
        match self {
            FeedRateMode::InverseTime => "G93",
            FeedRateMode::UnitsPerMinute => "G94",
        }
    }
}

/// Units group (group 6): G20, G21. Internally everything is millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    Inches,
    #[default]
    Millimeters,
}

impl Units {
    pub fn code(self) -> &'static str {
        match self {
            Units::Inches => "G20",
            Units::Millimeters => "G21",
        }
    }
}

/// Cutter radius compensation group (group 7). Only G40 (off) is
/// implemented; G41/G42 are unsupported codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutterComp {
    #[default]
    Off,
}

/// Tool length offset group (group 8): G43.1 (dynamic), G49 (cancel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolLengthMode {
    #[default]
    None,
    Dynamic,
}

/// Canned-cycle retract group (group 10): G98, G99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetractMode {
    #[default]
    InitialPoint,
    RPoint,
}

/// Path control group (group 13): G61, G64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode {
    #[default]
    ExactPath,
    Continuous,
}

/// Stopping group (group 4 of M codes): M0, M1, M2, M30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stopping {
    #[default]
    None,
    Pause,
    OptionalPause,
    End,
    EndRewind,
}

/// Spindle turning group: M3, M4, M5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpindleMode {
    #[default]
    Off,
    Clockwise,
    CounterClockwise,
}

impl SpindleMode {
    pub fn code(self) -> &'static str {
        match self {
            SpindleMode::Clockwise => "M3",
            SpindleMode::CounterClockwise => "M4",
            SpindleMode::Off => "M5",
        }
    }
}

/// Coolant group: M7, M8, M9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoolantMode {
    #[default]
    Off,
    Mist,
    Flood,
}

impl CoolantMode {
    pub fn code(self) -> &'static str {
        match self {
            CoolantMode::Mist => "M7",
            CoolantMode::Flood => "M8",
            CoolantMode::Off => "M9",
        }
    }
}

/// Feed/speed override enable group: M48, M49.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideMode {
    #[default]
    Enabled,
    Disabled,
}

/// Non-modal group (group 0). Applies only to the line it appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonModal {
    #[default]
    None,
    /// G4: dwell for P seconds.
    Dwell,
    /// G10: write coordinate-system offset data.
    SetCoordinateData,
    /// G28: rapid to the machine origin, optionally via an intermediate
    /// point.
    GoHome,
    /// G30: secondary variant of G28.
    GoHomeAlt,
    /// G53: this line's motion target is in machine coordinates.
    MachineCoords,
    /// G92: shift the work coordinates so the current position reads as
    /// the given values.
    SetOffsets,
    /// G92.1: clear the G92 offset.
    ClearOffsets,
}

impl NonModal {
    /// Non-modal codes that consume the line's axis words.
    pub fn uses_axis_words(self) -> bool {
        matches!(
            self,
            NonModal::SetCoordinateData
                | NonModal::GoHome
                | NonModal::GoHomeAlt
                | NonModal::SetOffsets
        )
    }
}

/// The currently active choice for every modal group, plus the transient
/// non-modal selection. `Default` is the power-on state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModalGroups {
    pub motion: MotionMode,
    pub plane: Plane,
    pub distance: DistanceMode,
    pub feed_rate: FeedRateMode,
    pub units: Units,
    pub cutter_comp: CutterComp,
    pub tool_length: ToolLengthMode,
    pub retract: RetractMode,
    /// Zero-based index into the coordinate-system table (G54 = 0).
    pub coord_system: u8,
    pub path: PathMode,
    pub stopping: Stopping,
    pub spindle: SpindleMode,
    pub coolant: CoolantMode,
    pub feed_override: OverrideMode,
    /// Holds no memory across lines; always `None` between lines.
    pub nonmodal: NonModal,
}

impl ModalGroups {
    /// Apply the RS274NGC program-end defaults (M2/M30): G54, G17, G90,
    /// G94, G40, overrides enabled, spindle and coolant off.
    pub fn program_end(&mut self) {
        self.coord_system = 0;
        self.plane = Plane::Xy;
        self.distance = DistanceMode::Absolute;
        self.feed_rate = FeedRateMode::UnitsPerMinute;
        self.cutter_comp = CutterComp::Off;
        self.feed_override = OverrideMode::Enabled;
        self.spindle = SpindleMode::Off;
        self.coolant = CoolantMode::Off;
    }
}

/// G-code name of a coordinate system index (0 → "G54", 6 → "G59.1").
pub fn coord_system_code(index: u8) -> String {
    if index < 6 {
        format!("G{}", 54 + index as u16)
    } else {
        format!("G59.{}", index - 5)
    }
}

/// Snapshot of the active modal selections and run values, in the shape
/// of a Grbl `$G` parser-state report.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalReport {
    pub motion: &'static str,
    pub coord_system: String,
    pub plane: &'static str,
    pub units: &'static str,
    pub distance: &'static str,
    pub feed_rate: &'static str,
    pub spindle: &'static str,
    pub coolant: &'static str,
    pub tool: u8,
    pub feedrate: f64,
    pub spindle_speed: f64,
}

impl fmt::Display for ModalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[GC:{} {} {} {} {} {} {} {} T{} F{} S{}]",
            self.motion,
            self.coord_system,
            self.plane,
            self.units,
            self.distance,
            self.feed_rate,
            self.spindle,
            self.coolant,
            self.tool,
            self.feedrate,
            self.spindle_speed,
        )
    }
}
