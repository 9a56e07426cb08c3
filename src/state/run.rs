//! Parser run state
//!
//! Process-lifetime values that are not modal selections: feedrate, tool,
//! spindle speed, the optional running line number, and the interpreter's
//! copy of the machine position. Reset on a system reset event; the
//! position is reconciled with the motion layer via `sync_position`.

use crate::parser::words::Axes;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunState {
    /// Active feedrate: mm/min in G94, 1/min in G93.
    pub feedrate: f64,
    /// Tool currently loaded in the spindle.
    pub tool_index: u8,
    /// Tool selected by the last T word; loaded by the next M6.
    pub selected_tool: u8,
    /// Programmed spindle speed, RPM.
    pub spindle_rpm: f64,
    /// Line number from the last N word, when any was given.
    pub line: Option<u32>,
    /// The interpreter's copy of the machine position, millimeters.
    pub position: Axes,
}

impl RunState {
    /// Power-on defaults. The position must be re-synced from the motion
    /// layer afterwards.
    pub fn reset(&mut self) {
        *self = RunState::default();
    }
}
