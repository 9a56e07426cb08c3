//! Interpreter context
//!
//! Owns the modal, run, and parameter state plus the collaborator
//! handles, and drives the tokenize → validate → execute pipeline for
//! each line. Explicitly instantiated (no process-wide state), so
//! independent interpreters can coexist deterministically.

use crate::config::MachineConfig;
use crate::error::Error;
use crate::extension::{ExtensionChain, ParserExtension};
use crate::machine::{MotionPlanner, ParameterStorage, ToolHal};
use crate::parser::tokenize;
use crate::parser::words::Axes;
use crate::state::modal::{
    CoolantMode, ModalGroups, ModalReport, SpindleMode, coord_system_code,
};
use crate::state::parameters::Parameters;
use crate::state::run::RunState;
use crate::validate::validate;

/// One GCode interpreter instance bound to its collaborators: the motion
/// planner `M`, the peripheral hardware `H`, and the non-volatile
/// parameter storage `S`.
pub struct Interpreter<M, H, S> {
    pub(crate) config: MachineConfig,
    pub(crate) modal: ModalGroups,
    pub(crate) run: RunState,
    pub(crate) params: Parameters,
    pub(crate) chain: ExtensionChain,
    pub(crate) planner: M,
    pub(crate) hal: H,
    pub(crate) storage: S,
}

impl<M: MotionPlanner, H: ToolHal, S: ParameterStorage> Interpreter<M, H, S> {
    /// Build an interpreter, populate the parameter store from storage,
    /// and sync the position from the motion layer.
    pub fn new(config: MachineConfig, planner: M, hal: H, mut storage: S) -> Self {
        let mut params = Parameters::new(&config);
        params.load(&mut storage, &config);
        let mut interpreter = Interpreter {
            config,
            modal: ModalGroups::default(),
            run: RunState::default(),
            params,
            chain: ExtensionChain::new(),
            planner,
            hal,
            storage,
        };
        interpreter.sync_position();
        interpreter
    }

    /// Append a parser extension; see [`ExtensionChain`].
    pub fn register_extension(&mut self, extension: Box<dyn ParserExtension>) {
        self.chain.register(extension);
    }

    /// Process one command line to completion: tokenize, validate,
    /// execute. Returns the line's status; on a validation error nothing
    /// has changed.
    pub fn process_line(&mut self, line: &str) -> Result<(), Error> {
        let block = tokenize(line, &mut self.chain)?;
        let descriptor = validate(block, &self.modal, &self.run, &self.config, &self.chain)?;
        self.execute(descriptor)
    }

    // --- queries ---

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn modal_state(&self) -> &ModalGroups {
        &self.modal
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Snapshot of the active modal codes and run values, in `$G` report
    /// shape.
    pub fn modes(&self) -> ModalReport {
        ModalReport {
            motion: self.modal.motion.code(),
            coord_system: coord_system_code(self.modal.coord_system),
            plane: self.modal.plane.code(),
            units: self.modal.units.code(),
            distance: self.modal.distance.code(),
            feed_rate: self.modal.feed_rate.code(),
            spindle: self.modal.spindle.code(),
            coolant: self.modal.coolant.code(),
            tool: self.run.tool_index,
            feedrate: self.run.feedrate,
            spindle_speed: self.run.spindle_rpm,
        }
    }

    pub fn feedrate(&self) -> f64 {
        self.run.feedrate
    }

    pub fn spindle(&self) -> (SpindleMode, f64) {
        (self.modal.spindle, self.run.spindle_rpm)
    }

    pub fn coolant(&self) -> CoolantMode {
        self.modal.coolant
    }

    /// Offset vector of a coordinate system, if the index is configured.
    pub fn coord_system_offset(&self, index: u8) -> Option<Axes> {
        self.params.coord_offset(index).copied()
    }

    /// Combined work coordinate offset: active system + G92 + tool
    /// length.
    pub fn work_offset(&self) -> Axes {
        self.params.work_offset()
    }

    /// Last probe position and whether that cycle triggered.
    pub fn probe_state(&self) -> (Axes, bool) {
        (self.params.last_probe_position, self.params.last_probe_ok)
    }

    /// The interpreter's copy of the machine position.
    pub fn position(&self) -> Axes {
        self.run.position
    }

    pub fn planner(&self) -> &M {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut M {
        &mut self.planner
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Release the collaborators, e.g. to hand storage to a new
    /// interpreter instance.
    pub fn into_parts(self) -> (M, H, S) {
        (self.planner, self.hal, self.storage)
    }

    // --- operations ---

    /// Populate the parameter store from storage; defaults on an absent
    /// or corrupt record.
    pub fn load_parameters(&mut self) {
        self.params.load(&mut self.storage, &self.config);
    }

    /// Persist the current in-memory parameter store.
    pub fn save_parameters(&mut self) -> std::io::Result<()> {
        self.params.save(&mut self.storage)
    }

    /// Write and persist factory defaults.
    pub fn reset_parameters(&mut self) -> std::io::Result<()> {
        self.params.reset(&mut self.storage, &self.config)
    }

    /// Reconcile the run-state position with the motion layer's
    /// authoritative machine position.
    pub fn sync_position(&mut self) {
        self.run.position = self.planner.machine_position();
    }

    /// Record the current machine position as the probe position.
    pub fn sync_probe(&mut self) {
        self.params.last_probe_position = self.planner.machine_position();
    }

    /// Reinitialize modal and run state to power-on defaults. The
    /// persisted parameter store is untouched.
    pub fn reset(&mut self) {
        self.modal = ModalGroups::default();
        self.run.reset();
        self.sync_position();
    }
}
