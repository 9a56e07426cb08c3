//! Command execution
//!
//! Commits a validated descriptor to the modal state, then dispatches
//! side effects in the RS274NGC section 3.8 canonical order: feed rate
//! mode, feedrate, spindle speed, tool select, tool change, spindle,
//! coolant, overrides, dwell, active modal changes, non-modal commands,
//! motion, stopping.
//!
//! Commit-before-dispatch is deliberate: once a line is syntactically and
//! semantically valid its modal selections stand, even when the planner
//! later rejects the physical motion. A rejection therefore surfaces as
//! `MotionRejected` without rollback, and a real-time cancellation stops
//! the remaining steps while keeping whatever was already committed.

use log::debug;

use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::machine::{
    MotionIntent, MotionKind, MotionPlanner, ParameterStorage, SubmitError, ToolHal,
};
use crate::parser::tokenizer::Block;
use crate::parser::words::{AXIS_COUNT, Axes, GroupSet, WordSet};
use crate::state::modal::{
    CoolantMode, DistanceMode, FeedRateMode, MotionMode, NonModal, SpindleMode, Stopping,
    ToolLengthMode, Units,
};
use crate::state::parameters::TLO_AXIS;
use crate::validate::Descriptor;
use crate::validate::engine::pending_motion;

const MM_PER_INCH: f64 = 25.4;

fn map_submit<T>(result: Result<T, SubmitError>) -> Result<T, Error> {
    result.map_err(|err| match err {
        SubmitError::Rejected => Error::MotionRejected,
        SubmitError::Cancelled => Error::Cancelled,
    })
}

/// Linear values arrive in the active units; everything downstream is
/// millimeters.
fn to_mm(value: f64, inch: bool) -> f64 {
    if inch { value * MM_PER_INCH } else { value }
}

/// Rotational axes are degrees in either unit system.
fn axis_to_mm(value: f64, axis: usize, inch: bool) -> f64 {
    if axis < 3 { to_mm(value, inch) } else { value }
}

impl<M: MotionPlanner, H: ToolHal, S: ParameterStorage> Interpreter<M, H, S> {
    pub(crate) fn execute(&mut self, descriptor: Descriptor) -> Result<(), Error> {
        let block = descriptor.block;
        self.commit_groups(&block);
        let result = self.dispatch(&block);
        // The non-modal selection holds no memory across lines.
        self.modal.nonmodal = NonModal::None;
        result
    }

    /// Overwrite each modal group field selected by this line. The
    /// non-modal selection is transient and cleared again once the line
    /// is done.
    fn commit_groups(&mut self, block: &Block) {
        let modes = &block.modes;
        if let Some(v) = modes.motion {
            self.modal.motion = v;
        }
        if let Some(v) = modes.plane {
            self.modal.plane = v;
        }
        if let Some(v) = modes.distance {
            self.modal.distance = v;
        }
        if let Some(v) = modes.feed_rate {
            self.modal.feed_rate = v;
        }
        if let Some(v) = modes.units {
            self.modal.units = v;
        }
        if let Some(v) = modes.cutter_comp {
            self.modal.cutter_comp = v;
        }
        if let Some(v) = modes.tool_length {
            self.modal.tool_length = v;
        }
        if let Some(v) = modes.retract {
            self.modal.retract = v;
        }
        if let Some(index) = modes.coord_system {
            self.modal.coord_system = index;
            self.params.coord_system_index = index;
        }
        if let Some(v) = modes.path {
            self.modal.path = v;
        }
        if let Some(v) = modes.stopping {
            self.modal.stopping = v;
        }
        if let Some(v) = modes.spindle {
            self.modal.spindle = v;
        }
        if let Some(v) = modes.coolant {
            self.modal.coolant = v;
        }
        if let Some(v) = modes.feed_override {
            self.modal.feed_override = v;
        }
        self.modal.nonmodal = modes.nonmodal;
    }

    fn dispatch(&mut self, block: &Block) -> Result<(), Error> {
        let ws = block.word_set;
        let words = &block.words;
        let inch = self.modal.units == Units::Inches;

        if let Some(n) = words.n {
            self.run.line = Some(n);
        }

        // Feed rate mode was committed with the groups; F next. In
        // inverse-time mode F is 1/min and carries no length unit.
        if ws.intersects(WordSet::F) {
            self.run.feedrate = if self.modal.feed_rate == FeedRateMode::InverseTime {
                words.f
            } else {
                to_mm(words.f, inch)
            };
        }
        if ws.intersects(WordSet::S) {
            self.run.spindle_rpm = words.s;
        }
        if ws.intersects(WordSet::T) {
            self.run.selected_tool = words.t as u8;
        }
        if block.groups.has(GroupSet::TOOL_CHANGE) {
            map_submit(self.hal.change_tool(self.run.selected_tool))?;
            self.run.tool_index = self.run.selected_tool;
            debug!("tool change: T{}", self.run.tool_index);
        }
        // A running spindle follows S changes; otherwise the hardware is
        // only touched when the spindle group itself was selected.
        if block.groups.has(GroupSet::SPINDLE)
            || (ws.intersects(WordSet::S) && self.modal.spindle != SpindleMode::Off)
        {
            map_submit(self.hal.set_spindle(self.modal.spindle, self.run.spindle_rpm))?;
        }
        if block.groups.has(GroupSet::COOLANT) {
            map_submit(self.hal.set_coolant(self.modal.coolant))?;
        }
        // Override enable/disable needs no hardware call.
        if self.modal.nonmodal == NonModal::Dwell {
            debug!("dwell {}s", words.p);
            map_submit(self.planner.dwell(words.p))?;
        }

        // Plane, units, cutter comp, coordinate system, path, distance
        // and retract mode were committed with the groups; the tool
        // length offset also writes the parameter store.
        match block.modes.tool_length {
            Some(ToolLengthMode::Dynamic) => {
                self.params.tool_length_offset = to_mm(words.xyzabc[TLO_AXIS], inch);
            }
            Some(ToolLengthMode::None) => self.params.tool_length_offset = 0.0,
            None => {}
        }

        match self.modal.nonmodal {
            NonModal::SetCoordinateData => self.write_coord_data(block, inch),
            NonModal::GoHome | NonModal::GoHomeAlt => self.go_home(block, inch)?,
            NonModal::SetOffsets => self.set_g92_offsets(block, inch),
            NonModal::ClearOffsets => self.params.g92_offset = [0.0; AXIS_COUNT],
            _ => {}
        }

        if let Some(motion) = pending_motion(block, &self.modal) {
            self.run_motion(motion, block, inch)?;
        }

        if block.extended {
            let mut chain = std::mem::take(&mut self.chain);
            let result = chain.execute(block, &mut self.modal, &mut self.run, &mut self.params);
            self.chain = chain;
            result?;
        }

        match self.modal.stopping {
            Stopping::Pause | Stopping::OptionalPause => {
                // The hold itself belongs to the real-time layer.
                debug!("program pause requested");
                self.modal.stopping = Stopping::None;
            }
            Stopping::End | Stopping::EndRewind => self.program_end()?,
            Stopping::None => {}
        }

        Ok(())
    }

    /// G10 L2: write offsets into the coordinate-system table. P0
    /// addresses the active system.
    fn write_coord_data(&mut self, block: &Block, inch: bool) {
        let p = block.words.p as u8;
        let index = if p == 0 {
            self.params.coord_system_index
        } else {
            p - 1
        };
        if let Some(offsets) = self.params.coord_offset_mut(index) {
            for axis in 0..AXIS_COUNT {
                if block.word_set.intersects(WordSet::axis(axis)) {
                    offsets[axis] = axis_to_mm(block.words.xyzabc[axis], axis, inch);
                }
            }
        }
        debug!("coordinate system {index} offsets updated");
    }

    /// G92: shift the work coordinates so the current position reads as
    /// the given axis values.
    fn set_g92_offsets(&mut self, block: &Block, inch: bool) {
        let system = *self.params.active_offset();
        let tlo = self.params.tool_length_offset;
        for axis in 0..AXIS_COUNT {
            if !block.word_set.intersects(WordSet::axis(axis)) {
                continue;
            }
            let value = axis_to_mm(block.words.xyzabc[axis], axis, inch);
            let mut offset = self.run.position[axis] - system[axis] - value;
            if axis == TLO_AXIS {
                offset -= tlo;
            }
            self.params.g92_offset[axis] = offset;
        }
    }

    /// G28/G30: rapid to the machine origin, optionally via an
    /// intermediate point given by the line's axis words.
    fn go_home(&mut self, block: &Block, inch: bool) -> Result<(), Error> {
        if block.word_set.intersects(WordSet::AXES) {
            let via = self.motion_target(block, inch);
            self.submit_rapid(via)?;
        }
        self.submit_rapid([0.0; AXIS_COUNT])
    }

    fn submit_rapid(&mut self, target: Axes) -> Result<(), Error> {
        let intent = MotionIntent {
            kind: MotionKind::Rapid,
            target,
            center_offsets: [0.0; 3],
            radius: None,
            feedrate: 0.0,
            inverse_time: false,
            plane: self.modal.plane,
        };
        map_submit(self.planner.submit(&intent))?;
        self.run.position = target;
        Ok(())
    }

    /// Resolve the line's axis words to an absolute machine-coordinate
    /// target, honoring distance mode, the work offset, and G53.
    fn motion_target(&self, block: &Block, inch: bool) -> Axes {
        let machine_coords = self.modal.nonmodal == NonModal::MachineCoords;
        let incremental = self.modal.distance == DistanceMode::Incremental && !machine_coords;
        let wco = self.params.work_offset();
        let mut target = self.run.position;
        for axis in 0..AXIS_COUNT {
            if !block.word_set.intersects(WordSet::axis(axis)) {
                continue;
            }
            let value = axis_to_mm(block.words.xyzabc[axis], axis, inch);
            target[axis] = if machine_coords {
                value
            } else if incremental {
                self.run.position[axis] + value
            } else {
                wco[axis] + value
            };
        }
        target
    }

    fn run_motion(&mut self, motion: MotionMode, block: &Block, inch: bool) -> Result<(), Error> {
        let target = self.motion_target(block, inch);
        let mut center_offsets = [0.0; 3];
        for (slot, offset) in center_offsets.iter_mut().enumerate() {
            if block.word_set.intersects(WordSet::offset(slot)) {
                *offset = to_mm(block.words.ijk[slot], inch);
            }
        }
        let radius = block
            .word_set
            .intersects(WordSet::R)
            .then(|| to_mm(block.words.r, inch));
        let kind = match motion {
            MotionMode::Rapid => MotionKind::Rapid,
            MotionMode::CwArc => MotionKind::Arc { clockwise: true },
            MotionMode::CcwArc => MotionKind::Arc { clockwise: false },
            _ => MotionKind::Linear,
        };
        let intent = MotionIntent {
            kind,
            target,
            center_offsets,
            radius,
            feedrate: if motion == MotionMode::Rapid {
                0.0
            } else {
                self.run.feedrate
            },
            inverse_time: self.modal.feed_rate == FeedRateMode::InverseTime,
            plane: self.modal.plane,
        };

        if motion.is_probe() {
            let outcome = map_submit(self.planner.probe(&intent, motion.probe_away()))?;
            if outcome.triggered {
                self.params.last_probe_position = outcome.position;
                self.params.last_probe_ok = true;
                self.run.position = outcome.position;
            } else {
                // Completed without contact: record the failed outcome
                // but keep the last successful probe position.
                self.params.last_probe_ok = false;
                self.run.position = target;
                if motion.probe_requires_trigger() {
                    return Err(Error::MotionRejected);
                }
            }
        } else {
            debug!("motion {kind:?} to {target:?}");
            map_submit(self.planner.submit(&intent))?;
            self.run.position = target;
        }
        Ok(())
    }

    /// M2/M30: restore the program-end modal defaults and shut spindle
    /// and coolant down.
    fn program_end(&mut self) -> Result<(), Error> {
        self.modal.program_end();
        self.modal.stopping = Stopping::None;
        self.params.coord_system_index = 0;
        map_submit(self.hal.set_spindle(SpindleMode::Off, 0.0))?;
        map_submit(self.hal.set_coolant(CoolantMode::Off))?;
        debug!("program end");
        Ok(())
    }
}
