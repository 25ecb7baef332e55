use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_dt() -> f64 {
    0.005
}
const fn default_decimation() -> u32 {
    4
}
const fn default_gpu_max_rigid_patch_count() -> u32 {
    10 * (1 << 15)
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// Read and deserialize a TOML file. Does not validate.
pub fn load_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Serialize a config as pretty TOML.
pub fn to_toml_string<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(value)?)
}

// ---------------------------------------------------------------------------
// PhysxCfg
// ---------------------------------------------------------------------------

/// Solver buffer sizing handed to the physics engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysxCfg {
    pub gpu_max_rigid_patch_count: u32,
}

impl Default for PhysxCfg {
    fn default() -> Self {
        Self {
            gpu_max_rigid_patch_count: default_gpu_max_rigid_patch_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// SimCfg
// ---------------------------------------------------------------------------

/// Simulation stepping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimCfg {
    /// Physics timestep in seconds (default: 0.005 = 200 Hz).
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Physics steps per policy step (default: 4, i.e. 50 Hz control).
    #[serde(default = "default_decimation")]
    pub decimation: u32,

    #[serde(default)]
    pub physx: PhysxCfg,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            decimation: default_decimation(),
            physx: PhysxCfg::default(),
        }
    }
}

impl SimCfg {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::invalid("sim.dt", format!("{} (must be > 0)", self.dt)));
        }
        if self.decimation == 0 {
            return Err(ConfigError::invalid("sim.decimation", "must be >= 1"));
        }
        if self.physx.gpu_max_rigid_patch_count == 0 {
            return Err(ConfigError::invalid(
                "sim.physx.gpu_max_rigid_patch_count",
                "must be >= 1",
            ));
        }
        Ok(())
    }

    /// Policy timestep in seconds.
    pub fn control_dt(&self) -> f64 {
        self.dt * f64::from(self.decimation)
    }

    /// Physics rate in Hz.
    pub fn physics_hz(&self) -> f64 {
        1.0 / self.dt
    }

    /// Control rate in Hz.
    pub fn control_hz(&self) -> f64 {
        1.0 / self.control_dt()
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
