//! Parameter persistence tests: round trips, corrupt records, factory
//! reset.

mod common;

use common::{MemStorage, RecordingHal, RecordingPlanner, interpreter};
use gcode_interpreter::machine::ParameterStorage;
use gcode_interpreter::{Interpreter, MachineConfig};

fn restart(interp: common::TestInterpreter) -> common::TestInterpreter {
    let (_, _, storage) = interp.into_parts();
    Interpreter::new(
        MachineConfig::default(),
        RecordingPlanner::default(),
        RecordingHal::default(),
        storage,
    )
}

#[test]
fn test_save_and_restart_round_trips_parameters() {
    let mut interp = interpreter();
    interp.process_line("G10 L2 P2 X7 Y-3").unwrap();
    interp.process_line("G55").unwrap();
    interp.process_line("G43.1 Z2.5").unwrap();
    interp.process_line("G92 X5").unwrap();
    interp.save_parameters().unwrap();

    let saved = interp.parameters().clone();
    let restarted = restart(interp);
    assert_eq!(*restarted.parameters(), saved);
    assert_eq!(restarted.parameters().coord_system_index, 1);
    assert_eq!(
        restarted.coord_system_offset(1).unwrap(),
        [7.0, -3.0, 0.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn test_unsaved_changes_do_not_survive_restart() {
    let mut interp = interpreter();
    interp.process_line("G10 L2 P2 X7").unwrap();

    let restarted = restart(interp);
    assert_eq!(restarted.coord_system_offset(1).unwrap(), [0.0; 6]);
}

#[test]
fn test_corrupt_record_loads_defaults() {
    let storage = MemStorage::with_record(b"not a parameter record".to_vec());
    let interp = Interpreter::new(
        MachineConfig::default(),
        RecordingPlanner::default(),
        RecordingHal::default(),
        storage,
    );
    assert_eq!(*interp.parameters(), gcode_interpreter::Parameters::new(&MachineConfig::default()));
}

#[test]
fn test_version_mismatch_loads_defaults() {
    let record = serde_json::json!({
        "version": 99,
        "tool_length_offset": 5.0,
        "coord_system_index": 2,
        "coord_offsets": [[0.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
        "g92_offset": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "last_probe_position": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "last_probe_ok": false,
    });
    let storage = MemStorage::with_record(record.to_string().into_bytes());
    let interp = Interpreter::new(
        MachineConfig::default(),
        RecordingPlanner::default(),
        RecordingHal::default(),
        storage,
    );
    assert_eq!(interp.parameters().tool_length_offset, 0.0);
    assert_eq!(interp.parameters().coord_system_index, 0);
}

#[test]
fn test_reset_parameters_persists_defaults() {
    let mut interp = interpreter();
    interp.process_line("G10 L2 P1 X10").unwrap();
    interp.save_parameters().unwrap();

    interp.reset_parameters().unwrap();
    assert_eq!(interp.coord_system_offset(0).unwrap(), [0.0; 6]);

    // The persisted record is the defaults, not the old offsets.
    let restarted = restart(interp);
    assert_eq!(restarted.coord_system_offset(0).unwrap(), [0.0; 6]);
}

/// File-backed storage, as the non-volatile collaborator would be on a
/// host-side controller.
struct FileStorage {
    path: std::path::PathBuf,
}

impl ParameterStorage for FileStorage {
    fn read(&mut self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::write(&self.path, bytes)
    }
}

#[test]
fn test_round_trip_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parameters.json");

    let mut interp = Interpreter::new(
        MachineConfig::default(),
        RecordingPlanner::default(),
        RecordingHal::default(),
        FileStorage { path: path.clone() },
    );
    interp.process_line("G10 L2 P3 X1.5 Z-0.25").unwrap();
    interp.save_parameters().unwrap();
    let saved = interp.parameters().clone();
    drop(interp);

    let reloaded = Interpreter::new(
        MachineConfig::default(),
        RecordingPlanner::default(),
        RecordingHal::default(),
        FileStorage { path },
    );
    assert_eq!(*reloaded.parameters(), saved);
}
