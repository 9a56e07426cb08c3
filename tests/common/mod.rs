//! Shared mock collaborators for the integration tests.

#![allow(dead_code)]

use gcode_interpreter::machine::{
    MotionIntent, MotionPlanner, ParameterStorage, ProbeOutcome, SubmitError, ToolHal,
};
use gcode_interpreter::parser::Axes;
use gcode_interpreter::state::modal::{CoolantMode, SpindleMode};
use gcode_interpreter::{Interpreter, MachineConfig};

/// Planner mock that records every request and can be armed to reject or
/// cancel the next submission.
#[derive(Debug, Default)]
pub struct RecordingPlanner {
    pub intents: Vec<MotionIntent>,
    pub dwells: Vec<f64>,
    pub position: Axes,
    pub reject_next: bool,
    pub cancel_next: bool,
    /// Whether the next probe cycle triggers, and where.
    pub probe_triggers: bool,
    pub probe_position: Axes,
}

impl RecordingPlanner {
    fn interrupt(&mut self) -> Result<(), SubmitError> {
        if std::mem::take(&mut self.reject_next) {
            return Err(SubmitError::Rejected);
        }
        if std::mem::take(&mut self.cancel_next) {
            return Err(SubmitError::Cancelled);
        }
        Ok(())
    }
}

impl MotionPlanner for RecordingPlanner {
    fn submit(&mut self, intent: &MotionIntent) -> Result<(), SubmitError> {
        self.interrupt()?;
        self.intents.push(*intent);
        self.position = intent.target;
        Ok(())
    }

    fn dwell(&mut self, seconds: f64) -> Result<(), SubmitError> {
        self.interrupt()?;
        self.dwells.push(seconds);
        Ok(())
    }

    fn probe(&mut self, intent: &MotionIntent, _away: bool) -> Result<ProbeOutcome, SubmitError> {
        self.interrupt()?;
        self.intents.push(*intent);
        if self.probe_triggers {
            Ok(ProbeOutcome {
                position: self.probe_position,
                triggered: true,
            })
        } else {
            Ok(ProbeOutcome {
                position: intent.target,
                triggered: false,
            })
        }
    }

    fn machine_position(&self) -> Axes {
        self.position
    }
}

/// Hardware mock that records every request.
#[derive(Debug, Default)]
pub struct RecordingHal {
    pub spindle: Vec<(SpindleMode, f64)>,
    pub coolant: Vec<CoolantMode>,
    pub tools: Vec<u8>,
    pub cancel_next: bool,
}

impl ToolHal for RecordingHal {
    fn set_spindle(&mut self, mode: SpindleMode, rpm: f64) -> Result<(), SubmitError> {
        if std::mem::take(&mut self.cancel_next) {
            return Err(SubmitError::Cancelled);
        }
        self.spindle.push((mode, rpm));
        Ok(())
    }

    fn set_coolant(&mut self, mode: CoolantMode) -> Result<(), SubmitError> {
        self.coolant.push(mode);
        Ok(())
    }

    fn change_tool(&mut self, index: u8) -> Result<(), SubmitError> {
        if std::mem::take(&mut self.cancel_next) {
            return Err(SubmitError::Cancelled);
        }
        self.tools.push(index);
        Ok(())
    }
}

/// In-memory parameter storage.
#[derive(Debug, Default)]
pub struct MemStorage {
    pub record: Option<Vec<u8>>,
}

impl MemStorage {
    pub fn with_record(record: Vec<u8>) -> Self {
        MemStorage {
            record: Some(record),
        }
    }
}

impl ParameterStorage for MemStorage {
    fn read(&mut self) -> std::io::Result<Vec<u8>> {
        self.record
            .clone()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
    }

    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.record = Some(bytes.to_vec());
        Ok(())
    }
}

pub type TestInterpreter = Interpreter<RecordingPlanner, RecordingHal, MemStorage>;

/// A fresh interpreter over the default machine config and empty storage.
pub fn interpreter() -> TestInterpreter {
    Interpreter::new(
        MachineConfig::default(),
        RecordingPlanner::default(),
        RecordingHal::default(),
        MemStorage::default(),
    )
}
