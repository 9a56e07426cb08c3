//! GCode Command Interpreter
//!
//! An RS274NGC command interpreter and modal state machine for a CNC
//! motion controller.
//!
//! One text line goes in, one validated machine action comes out:
//! - Tokenizer: line → word values plus word/group selection masks
//! - Validator: legality rules against the current modal state
//! - Executor: canonical-order dispatch into the motion planner and
//!   peripheral HAL collaborators
//!
//! Persistent state (modal group selections, run values, the parameter
//! store) lives in an explicit [`Interpreter`] context, and a pluggable
//! [`extension`] chain claims non-core codes without touching the core
//! rule tables.

pub mod config;
pub mod error;
pub mod extension;
pub mod interpreter;
pub mod machine;
pub mod parser;
pub mod state;
pub mod validate;

mod exec;

// Re-exports for a clean public API
pub use config::MachineConfig;
pub use error::Error;
pub use extension::{Claim, ExtensionChain, ParserExtension};
pub use interpreter::Interpreter;
pub use machine::{
    MotionIntent, MotionKind, MotionPlanner, ParameterStorage, ProbeOutcome, SubmitError, ToolHal,
};
pub use parser::{AXIS_COUNT, Axes, Block, WordValues, tokenize};
pub use state::{ModalGroup, ModalGroups, ModalReport, Parameters, RunState};
pub use validate::{Descriptor, validate};
