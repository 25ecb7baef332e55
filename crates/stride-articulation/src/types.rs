//! Robot spawn, initial state and articulation configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stride_core::check;
use stride_core::error::ConfigError;
use stride_core::pattern::{PatternMap, is_literal};

use crate::actuator::ImplicitActuatorCfg;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_max_velocity() -> f32 {
    1000.0
}
const fn default_max_depenetration_velocity() -> f32 {
    1.0
}
const fn default_true() -> bool {
    true
}
const fn default_position_iterations() -> u32 {
    4
}
const fn default_velocity_iterations() -> u32 {
    1
}
const fn default_rot() -> [f32; 4] {
    [1.0, 0.0, 0.0, 0.0]
}
const fn default_soft_limit_factor() -> f32 {
    1.0
}
fn default_joint_vel() -> PatternMap<f32> {
    PatternMap::new().with(".*", 0.0)
}

// ---------------------------------------------------------------------------
// RigidBodyPropertiesCfg
// ---------------------------------------------------------------------------

/// Per-body solver properties applied to every link of the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyPropertiesCfg {
    #[serde(default)]
    pub disable_gravity: bool,
    #[serde(default)]
    pub retain_accelerations: bool,
    #[serde(default)]
    pub linear_damping: f32,
    #[serde(default)]
    pub angular_damping: f32,
    /// Linear velocity cap (m/s).
    #[serde(default = "default_max_velocity")]
    pub max_linear_velocity: f32,
    /// Angular velocity cap (rad/s).
    #[serde(default = "default_max_velocity")]
    pub max_angular_velocity: f32,
    /// Maximum velocity used to push apart interpenetrating bodies (m/s).
    #[serde(default = "default_max_depenetration_velocity")]
    pub max_depenetration_velocity: f32,
}

impl Default for RigidBodyPropertiesCfg {
    fn default() -> Self {
        Self {
            disable_gravity: false,
            retain_accelerations: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
            max_linear_velocity: default_max_velocity(),
            max_angular_velocity: default_max_velocity(),
            max_depenetration_velocity: default_max_depenetration_velocity(),
        }
    }
}

impl RigidBodyPropertiesCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check::non_negative("spawn.rigid_props.linear_damping", self.linear_damping)?;
        check::non_negative("spawn.rigid_props.angular_damping", self.angular_damping)?;
        check::positive("spawn.rigid_props.max_linear_velocity", self.max_linear_velocity)?;
        check::positive("spawn.rigid_props.max_angular_velocity", self.max_angular_velocity)?;
        check::non_negative(
            "spawn.rigid_props.max_depenetration_velocity",
            self.max_depenetration_velocity,
        )
    }
}

// ---------------------------------------------------------------------------
// ArticulationRootPropertiesCfg
// ---------------------------------------------------------------------------

/// Solver settings for the articulation root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticulationRootPropertiesCfg {
    #[serde(default = "default_true")]
    pub enabled_self_collisions: bool,
    #[serde(default = "default_position_iterations")]
    pub solver_position_iteration_count: u32,
    #[serde(default = "default_velocity_iterations")]
    pub solver_velocity_iteration_count: u32,
}

impl Default for ArticulationRootPropertiesCfg {
    fn default() -> Self {
        Self {
            enabled_self_collisions: true,
            solver_position_iteration_count: default_position_iterations(),
            solver_velocity_iteration_count: default_velocity_iterations(),
        }
    }
}

// ---------------------------------------------------------------------------
// UsdFileCfg
// ---------------------------------------------------------------------------

/// Where the robot model comes from and how its bodies are simulated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UsdFileCfg {
    pub usd_path: PathBuf,
    #[serde(default)]
    pub activate_contact_sensors: bool,
    #[serde(default)]
    pub rigid_props: RigidBodyPropertiesCfg,
    #[serde(default)]
    pub articulation_props: ArticulationRootPropertiesCfg,
}

impl UsdFileCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.usd_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("spawn.usd_path".into()));
        }
        self.rigid_props.validate()?;
        if self.articulation_props.solver_position_iteration_count == 0 {
            return Err(ConfigError::invalid(
                "spawn.articulation_props.solver_position_iteration_count",
                "must be >= 1",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InitialStateCfg
// ---------------------------------------------------------------------------

/// Root pose and joint state the robot is reset to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialStateCfg {
    /// Root position `[x, y, z]` in meters.
    #[serde(default)]
    pub pos: [f32; 3],
    /// Root orientation quaternion `[w, x, y, z]`.
    #[serde(default = "default_rot")]
    pub rot: [f32; 4],
    #[serde(default)]
    pub lin_vel: [f32; 3],
    #[serde(default)]
    pub ang_vel: [f32; 3],
    /// Joint positions by name pattern. Plain-name keys declare the joints.
    #[serde(default)]
    pub joint_pos: PatternMap<f32>,
    /// Joint velocities by name pattern.
    #[serde(default = "default_joint_vel")]
    pub joint_vel: PatternMap<f32>,
}

impl Default for InitialStateCfg {
    fn default() -> Self {
        Self {
            pos: [0.0; 3],
            rot: default_rot(),
            lin_vel: [0.0; 3],
            ang_vel: [0.0; 3],
            joint_pos: PatternMap::new(),
            joint_vel: default_joint_vel(),
        }
    }
}

impl InitialStateCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let vectors: [(&str, &[f32]); 4] = [
            ("init_state.pos", &self.pos),
            ("init_state.rot", &self.rot),
            ("init_state.lin_vel", &self.lin_vel),
            ("init_state.ang_vel", &self.ang_vel),
        ];
        for (field, values) in vectors {
            for v in values {
                check::finite(field, *v)?;
            }
        }
        let norm_sq: f32 = self.rot.iter().map(|q| q * q).sum();
        if norm_sq <= f32::EPSILON {
            return Err(ConfigError::invalid("init_state.rot", "quaternion has zero norm"));
        }
        for (pattern, v) in self.joint_pos.iter() {
            check::finite(&format!("init_state.joint_pos.{pattern}"), *v)?;
        }
        for (pattern, v) in self.joint_vel.iter() {
            check::finite(&format!("init_state.joint_vel.{pattern}"), *v)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ArticulationCfg
// ---------------------------------------------------------------------------

/// Complete description of a simulated robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticulationCfg {
    pub spawn: UsdFileCfg,
    #[serde(default)]
    pub init_state: InitialStateCfg,
    /// Fraction of the hard joint range the controller may use.
    #[serde(default = "default_soft_limit_factor")]
    pub soft_joint_pos_limit_factor: f32,
    /// Actuator groups by name.
    #[serde(default)]
    pub actuators: BTreeMap<String, ImplicitActuatorCfg>,
    /// Rigid body (link) names of the asset, used to resolve body selectors.
    #[serde(default)]
    pub body_names: Vec<String>,
}

impl Default for ArticulationCfg {
    fn default() -> Self {
        Self {
            spawn: UsdFileCfg::default(),
            init_state: InitialStateCfg::default(),
            soft_joint_pos_limit_factor: default_soft_limit_factor(),
            actuators: BTreeMap::new(),
            body_names: Vec::new(),
        }
    }
}

impl ArticulationCfg {
    /// Joints declared by plain-name keys of `init_state.joint_pos`, in
    /// declaration order.
    pub fn joint_names(&self) -> Vec<&str> {
        self.init_state
            .joint_pos
            .keys()
            .filter(|k| is_literal(k))
            .collect()
    }

    /// Builder: add or replace an actuator group.
    #[must_use]
    pub fn with_actuator(mut self, name: impl Into<String>, group: ImplicitActuatorCfg) -> Self {
        self.actuators.insert(name.into(), group);
        self
    }

    /// Range and presence checks (no pattern resolution).
    pub fn check_values(&self) -> Result<(), ConfigError> {
        self.spawn.validate()?;
        self.init_state.validate()?;
        check::positive("soft_joint_pos_limit_factor", self.soft_joint_pos_limit_factor)?;
        check::within(
            "soft_joint_pos_limit_factor",
            self.soft_joint_pos_limit_factor,
            0.0,
            1.0,
        )?;
        for (name, group) in &self.actuators {
            group.validate(&format!("actuators.{name}"))?;
        }
        Ok(())
    }

    /// Full validation: range checks plus joint resolution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve().map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
