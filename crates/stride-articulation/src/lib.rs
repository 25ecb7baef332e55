//! Articulated robot configuration for stride.
//!
//! An [`ArticulationCfg`] describes where a robot model comes from, its
//! initial pose, and its actuator groups. Groups select joints by name
//! pattern; [`ArticulationCfg::resolve`] turns the patterns into a per-joint
//! table and rejects patterns that select nothing.

pub mod actuator;
pub mod resolve;
pub mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use actuator::{Gain, ImplicitActuatorCfg};
pub use resolve::{ResolvedArticulation, ResolvedJoint};
pub use types::{
    ArticulationCfg, ArticulationRootPropertiesCfg, InitialStateCfg, RigidBodyPropertiesCfg,
    UsdFileCfg,
};
