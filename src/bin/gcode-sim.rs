//! Offline interpreter driver
//!
//! Streams a GCode file (or stdin) through the interpreter with
//! simulated collaborators and prints one status per line, Grbl-style.
//! Useful for checking a program's legality before it reaches a machine.

use std::io::{BufRead, BufReader, Read};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use gcode_interpreter::config::Args;
use gcode_interpreter::machine::{
    MotionIntent, MotionPlanner, ParameterStorage, ProbeOutcome, SubmitError, ToolHal,
};
use gcode_interpreter::parser::Axes;
use gcode_interpreter::state::modal::{CoolantMode, SpindleMode};
use gcode_interpreter::{Interpreter, MachineConfig};

/// Planner stand-in: accepts everything, tracks position, triggers every
/// probe at its target.
#[derive(Debug, Default)]
struct SimPlanner {
    position: Axes,
}

impl MotionPlanner for SimPlanner {
    fn submit(&mut self, intent: &MotionIntent) -> Result<(), SubmitError> {
        info!("motion {:?} to {:?}", intent.kind, intent.target);
        self.position = intent.target;
        Ok(())
    }

    fn dwell(&mut self, seconds: f64) -> Result<(), SubmitError> {
        info!("dwell {seconds}s");
        Ok(())
    }

    fn probe(&mut self, intent: &MotionIntent, _away: bool) -> Result<ProbeOutcome, SubmitError> {
        info!("probe toward {:?}", intent.target);
        self.position = intent.target;
        Ok(ProbeOutcome {
            position: intent.target,
            triggered: true,
        })
    }

    fn machine_position(&self) -> Axes {
        self.position
    }
}

/// Hardware stand-in: logs every request.
#[derive(Debug, Default)]
struct SimHal;

impl ToolHal for SimHal {
    fn set_spindle(&mut self, mode: SpindleMode, rpm: f64) -> Result<(), SubmitError> {
        info!("spindle {} at {rpm} RPM", mode.code());
        Ok(())
    }

    fn set_coolant(&mut self, mode: CoolantMode) -> Result<(), SubmitError> {
        info!("coolant {}", mode.code());
        Ok(())
    }

    fn change_tool(&mut self, index: u8) -> Result<(), SubmitError> {
        info!("tool change to T{index}");
        Ok(())
    }
}

/// Volatile parameter storage for one simulator run.
#[derive(Debug, Default)]
struct SimStorage {
    record: Option<Vec<u8>>,
}

impl ParameterStorage for SimStorage {
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

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level.as_str()),
    )
    .init();

    let config = match &args.config {
        Some(path) => MachineConfig::from_file(path)?,
        None => MachineConfig::default(),
    };

    let reader: Box<dyn Read> = match &args.file {
        Some(path) => Box::new(
            std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(std::io::stdin()),
    };

    let mut interpreter = Interpreter::new(
        config,
        SimPlanner::default(),
        SimHal::default(),
        SimStorage::default(),
    );

    for (number, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.context("reading input")?;
        match interpreter.process_line(&line) {
            Ok(()) => println!("ok"),
            Err(err) => println!("error (line {}): {err}", number + 1),
        }
    }

    if args.report {
        println!("{}", interpreter.modes());
    }

    Ok(())
}
