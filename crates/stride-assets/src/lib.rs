//! Robot presets for stride.
//!
//! Asset paths are rooted at [`asset_dir`], which honours the
//! `STRIDE_ASSET_DIR` environment variable.

pub mod robots;

use std::path::PathBuf;

use stride_articulation::ArticulationCfg;
use stride_core::error::StrideError;
use tracing::debug;

pub use robots::{atom, duck};

/// Environment variable overriding the asset root.
pub const ASSET_DIR_ENV: &str = "STRIDE_ASSET_DIR";

/// Names accepted by [`robot`].
pub const ROBOT_NAMES: [&str; 2] = ["atom", "duck"];

/// Root directory for robot model files.
pub fn asset_dir() -> PathBuf {
    std::env::var_os(ASSET_DIR_ENV).map_or_else(
        || PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data")),
        PathBuf::from,
    )
}

/// Look up a preset by name.
pub fn robot(name: &str) -> Result<ArticulationCfg, StrideError> {
    debug!(robot = name, "loading robot preset");
    match name {
        "atom" => Ok(atom()),
        "duck" => Ok(duck()),
        other => Err(StrideError::UnknownRobot(other.to_string())),
    }
}
