//! Persistent parser parameters
//!
//! The workspace data that outlives single lines: per-coordinate-system
//! offsets, the G92 offset, the tool length offset, and the last probe
//! result. Persisted through the byte-oriented `ParameterStorage`
//! collaborator as one versioned record; anything absent or corrupt loads
//! as safe defaults.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::MachineConfig;
use crate::machine::ParameterStorage;
use crate::parser::words::{AXIS_COUNT, Axes};

/// Axis slot that carries the tool length offset.
pub const TLO_AXIS: usize = 2;

const RECORD_VERSION: u32 = 1;

/// In-memory parameter store.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// Tool length offset, millimeters, applied on the Z axis.
    pub tool_length_offset: f64,
    /// Zero-based index of the selected coordinate system.
    pub coord_system_index: u8,
    coord_offsets: Vec<Axes>,
    /// G92 coordinate shift, applied on top of the active system.
    pub g92_offset: Axes,
    /// Machine position recorded by the last triggered probe.
    pub last_probe_position: Axes,
    /// Whether the last completed probe cycle triggered.
    pub last_probe_ok: bool,
}

/// On-storage layout of one parameter set.
#[derive(Debug, Serialize, Deserialize)]
struct ParameterRecord {
    version: u32,
    tool_length_offset: f64,
    coord_system_index: u8,
    coord_offsets: Vec<Axes>,
    g92_offset: Axes,
    last_probe_position: Axes,
    last_probe_ok: bool,
}

impl Parameters {
    /// Factory defaults sized to the configured coordinate-system table.
    pub fn new(config: &MachineConfig) -> Self {
        Parameters {
            tool_length_offset: 0.0,
            coord_system_index: 0,
            coord_offsets: vec![[0.0; AXIS_COUNT]; config.coord_system_count],
            g92_offset: [0.0; AXIS_COUNT],
            last_probe_position: [0.0; AXIS_COUNT],
            last_probe_ok: false,
        }
    }

    /// Offset vector of a coordinate system, if the index is in range.
    pub fn coord_offset(&self, index: u8) -> Option<&Axes> {
        self.coord_offsets.get(index as usize)
    }

    pub(crate) fn coord_offset_mut(&mut self, index: u8) -> Option<&mut Axes> {
        self.coord_offsets.get_mut(index as usize)
    }

    /// Offset vector of the selected coordinate system.
    pub fn active_offset(&self) -> &Axes {
        &self.coord_offsets[self.coord_system_index as usize]
    }

    /// Work coordinate offset: active system offset + G92 offset, with
    /// the tool length offset folded into the Z axis.
    pub fn work_offset(&self) -> Axes {
        let mut wco = *self.active_offset();
        for (axis, g92) in wco.iter_mut().zip(self.g92_offset) {
            *axis += g92;
        }
        wco[TLO_AXIS] += self.tool_length_offset;
        wco
    }

    /// Populate from storage. A missing, corrupt, or version-mismatched
    /// record yields factory defaults instead of undefined values.
    pub fn load<S: ParameterStorage>(&mut self, storage: &mut S, config: &MachineConfig) {
        *self = Parameters::new(config);
        let bytes = match storage.read() {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!("no stored parameters ({err}); using defaults");
                return;
            }
        };
        match serde_json::from_slice::<ParameterRecord>(&bytes) {
            Ok(record) if record.version == RECORD_VERSION => {
                self.tool_length_offset = record.tool_length_offset;
                self.coord_system_index =
                    record.coord_system_index.min(config.coord_system_count as u8 - 1);
                self.coord_offsets = record.coord_offsets;
                self.coord_offsets
                    .resize(config.coord_system_count, [0.0; AXIS_COUNT]);
                self.g92_offset = record.g92_offset;
                self.last_probe_position = record.last_probe_position;
                self.last_probe_ok = record.last_probe_ok;
            }
            Ok(record) => {
                warn!(
                    "parameter record version {} does not match {}; using defaults",
                    record.version, RECORD_VERSION
                );
            }
            Err(err) => {
                warn!("corrupt parameter record ({err}); using defaults");
            }
        }
    }

    /// Persist the current in-memory contents.
    pub fn save<S: ParameterStorage>(&self, storage: &mut S) -> std::io::Result<()> {
        let record = ParameterRecord {
            version: RECORD_VERSION,
            tool_length_offset: self.tool_length_offset,
            coord_system_index: self.coord_system_index,
            coord_offsets: self.coord_offsets.clone(),
            g92_offset: self.g92_offset,
            last_probe_position: self.last_probe_position,
            last_probe_ok: self.last_probe_ok,
        };
        let bytes = serde_json::to_vec(&record).map_err(std::io::Error::other)?;
        storage.write(&bytes)
    }

    /// Write and persist factory defaults.
    pub fn reset<S: ParameterStorage>(
        &mut self,
        storage: &mut S,
        config: &MachineConfig,
    ) -> std::io::Result<()> {
        *self = Parameters::new(config);
        self.save(storage)
    }
}
