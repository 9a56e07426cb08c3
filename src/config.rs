//! Configuration
//!
//! Handles:
//! - Command-line argument parsing for the `gcode-sim` binary
//! - Machine limits the validator checks numeric words against

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

/// Command-line arguments for the offline interpreter driver.
#[derive(Debug, Parser)]
#[command(name = "gcode-sim")]
#[command(about = "Stream a GCode file through the interpreter")]
#[command(version)]
pub struct Args {
    /// GCode file to process; stdin when omitted
    pub file: Option<PathBuf>,

    /// Machine configuration TOML file
    #[arg(long, help = "Path to a machine configuration TOML file")]
    pub config: Option<PathBuf>,

    /// Print the parser-state report after the last line
    #[arg(long)]
    pub report: bool,

    /// Log level for the simulator
    #[arg(
        long,
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Machine limits consulted during validation. Loaded from a TOML file
/// when provided; the defaults match a small mill.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Number of work coordinate systems (G54 and up, at most 9).
    pub coord_system_count: usize,
    /// Highest addressable tool number.
    pub tool_count: u8,
    /// Optional spindle speed ceiling, RPM.
    pub spindle_max_rpm: Option<f64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            coord_system_count: 6,
            tool_count: 16,
            spindle_max_rpm: None,
        }
    }
}

impl MachineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: MachineConfig =
            toml::from_str(text).context("invalid machine configuration")?;
        config.coord_system_count = config.coord_system_count.clamp(1, 9);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MachineConfig::default();
        assert_eq!(config.coord_system_count, 6);
        assert_eq!(config.tool_count, 16);
        assert!(config.spindle_max_rpm.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let config = MachineConfig::from_toml_str(
            "coord_system_count = 9\ntool_count = 4\nspindle_max_rpm = 12000.0\n",
        )
        .unwrap();
        assert_eq!(config.coord_system_count, 9);
        assert_eq!(config.tool_count, 4);
        assert_eq!(config.spindle_max_rpm, Some(12000.0));
    }

    #[test]
    fn test_coord_system_count_is_clamped() {
        let config = MachineConfig::from_toml_str("coord_system_count = 40\n").unwrap();
        assert_eq!(config.coord_system_count, 9);
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(MachineConfig::from_toml_str("tool_count = \"many\"").is_err());
    }
}
