//! TOML configuration for the fly-by-wire system.
//!
//! Every field is optional. A missing file section falls back to the values
//! the aircraft ships with.

use crate::{error::ConfigError, pid::PidGains, pitch_controller::PitchGains};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbwConfig {
    /// When false only the data history (and recorder) run; no surface is commanded.
    pub enable_fbw_system: bool,
    pub enable_data_recorder: bool,
    /// Where `FlightDataRecorder-<time>.csv` files are written.
    pub recorder_directory: PathBuf,
    /// Fraction of each sidestick axis around neutral that reads as zero.
    pub sidestick_deadband: f64,
    pub gains: PitchGains,
}

impl Default for FbwConfig {
    fn default() -> Self {
        FbwConfig {
            enable_fbw_system: true,
            enable_data_recorder: false,
            recorder_directory: PathBuf::from("."),
            sidestick_deadband: 0.0,
            gains: PitchGains::default(),
        }
    }
}

impl FbwConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "loaded fly-by-wire configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FbwConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.sidestick_deadband) {
            return Err(ConfigError::Invalid(format!(
                "sidestick_deadband {} out of range [0, 1)",
                self.sidestick_deadband
            )));
        }
        validate_gains("aoa", &self.gains.aoa)?;
        validate_gains("load_factor", &self.gains.load_factor)?;
        validate_gains("vertical_fpa", &self.gains.vertical_fpa)?;
        validate_gains("pitch_rate", &self.gains.pitch_rate)?;
        Ok(())
    }
}

fn validate_gains(name: &str, gains: &PidGains) -> Result<(), ConfigError> {
    let values = [
        gains.output_min,
        gains.output_max,
        gains.kp,
        gains.ki,
        gains.kd,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::Invalid(format!(
            "gains.{name}: every gain must be finite"
        )));
    }
    if gains.output_min > gains.output_max {
        return Err(ConfigError::Invalid(format!(
            "gains.{name}: output_min {} exceeds output_max {}",
            gains.output_min, gains.output_max
        )));
    }
    Ok(())
}
