//! Machine collaborator interfaces
//!
//! Trait seams to the real-time side of the controller: the motion
//! planner, the spindle/coolant/tool hardware, and non-volatile storage.
//! The interpreter calls these synchronously; a planner implementation
//! may block inside `submit` while its queue is full (bounded
//! backpressure), and any call may report cancellation when a reset or
//! feed hold aborts it.

use thiserror::Error;

use crate::parser::words::Axes;
use crate::state::modal::{CoolantMode, Plane, SpindleMode};

/// Why a collaborator call did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The request itself was refused (e.g. malformed arc geometry).
    #[error("rejected by the motion layer")]
    Rejected,
    /// A reset or feed hold aborted the request.
    #[error("cancelled by a real-time event")]
    Cancelled,
}

/// Kind of one validated motion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Rapid,
    Linear,
    Arc { clockwise: bool },
}

/// One validated motion request, fully resolved to machine coordinates
/// and millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionIntent {
    pub kind: MotionKind,
    /// Absolute machine-coordinate target.
    pub target: Axes,
    /// Arc center offsets (I, J, K) relative to the start point.
    pub center_offsets: [f64; 3],
    /// Radius-format alternative to the center offsets.
    pub radius: Option<f64>,
    /// Feedrate for feed motions: mm/min, or 1/min in inverse-time mode.
    pub feedrate: f64,
    pub inverse_time: bool,
    /// Plane the arc (if any) is interpreted in.
    pub plane: Plane,
}

/// Result of a motion-until-trigger request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
    /// Machine position where the cycle stopped.
    pub position: Axes,
    /// Whether the probe input actually triggered.
    pub triggered: bool,
}

/// The motion planner / segment buffer this interpreter feeds.
pub trait MotionPlanner {
    /// Queue a motion. May block while the planner queue is full.
    fn submit(&mut self, intent: &MotionIntent) -> Result<(), SubmitError>;

    /// Hold the queue position for the given number of seconds.
    fn dwell(&mut self, seconds: f64) -> Result<(), SubmitError>;

    /// Move toward (or away from, for the away-mode probes) the target
    /// until the probe input triggers or the target is reached.
    fn probe(&mut self, intent: &MotionIntent, away: bool) -> Result<ProbeOutcome, SubmitError>;

    /// Authoritative machine position, for sync operations.
    fn machine_position(&self) -> Axes;
}

/// Spindle, coolant, and tool-changer hardware.
pub trait ToolHal {
    fn set_spindle(&mut self, mode: SpindleMode, rpm: f64) -> Result<(), SubmitError>;
    fn set_coolant(&mut self, mode: CoolantMode) -> Result<(), SubmitError>;
    fn change_tool(&mut self, index: u8) -> Result<(), SubmitError>;
}

/// Byte-oriented non-volatile storage for the parameter record.
pub trait ParameterStorage {
    fn read(&mut self) -> std::io::Result<Vec<u8>>;
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}
