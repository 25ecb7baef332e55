//! Reset and interval events that perturb the simulation.
//!
//! Each event owns its parameter ranges as `(low, high)` pairs and knows how
//! to draw one realization with a caller-supplied RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};
use stride_core::check;
use stride_core::error::ConfigError;

use crate::ranges::RandomizationRange;

/// Masses are never randomized below this (kg).
pub const MIN_MASS: f32 = 1e-6;

fn draw<R: Rng + ?Sized>(field: &str, pair: (f32, f32), rng: &mut R) -> Result<f32, ConfigError> {
    Ok(RandomizationRange::from_pair(pair)
        .map_err(|e| e.at(field))?
        .sample(rng))
}

// ---------------------------------------------------------------------------
// AxisRanges
// ---------------------------------------------------------------------------

/// Optional `(low, high)` per pose or twist axis. Missing axes stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisRanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<(f32, f32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<(f32, f32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<(f32, f32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll: Option<(f32, f32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<(f32, f32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaw: Option<(f32, f32)>,
}

impl AxisRanges {
    /// Same range on every axis.
    pub const fn all(pair: (f32, f32)) -> Self {
        Self {
            x: Some(pair),
            y: Some(pair),
            z: Some(pair),
            roll: Some(pair),
            pitch: Some(pair),
            yaw: Some(pair),
        }
    }

    fn axes(&self) -> [(&'static str, Option<(f32, f32)>); 6] {
        [
            ("x", self.x),
            ("y", self.y),
            ("z", self.z),
            ("roll", self.roll),
            ("pitch", self.pitch),
            ("yaw", self.yaw),
        ]
    }

    /// `[x, y, z, roll, pitch, yaw]`.
    pub fn sample<R: Rng + ?Sized>(&self, field: &str, rng: &mut R) -> Result<[f32; 6], ConfigError> {
        let mut out = [0.0; 6];
        for (slot, (axis, pair)) in out.iter_mut().zip(self.axes()) {
            if let Some(pair) = pair {
                *slot = draw(&format!("{field}.{axis}"), pair, rng)?;
            }
        }
        Ok(out)
    }

    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        for (axis, pair) in self.axes() {
            if let Some(pair) = pair {
                check::ordered_pair(&format!("{field}.{axis}"), pair)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PhysicsMaterialCfg
// ---------------------------------------------------------------------------

/// Friction and restitution drawn once at startup into a fixed number of
/// buckets, then assigned to bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsMaterialCfg {
    pub static_friction_range: (f32, f32),
    pub dynamic_friction_range: (f32, f32),
    pub restitution_range: (f32, f32),
    pub num_buckets: u32,
}

impl Default for PhysicsMaterialCfg {
    fn default() -> Self {
        Self {
            static_friction_range: (0.6, 1.0),
            dynamic_friction_range: (0.4, 0.8),
            restitution_range: (0.0, 0.005),
            num_buckets: 64,
        }
    }
}

impl PhysicsMaterialCfg {
    /// `[static, dynamic, restitution]` per bucket.
    pub fn sample_buckets<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<[f32; 3]>, ConfigError> {
        let field = "domain_rand.physics_material";
        (0..self.num_buckets)
            .map(|_| {
                Ok([
                    draw(&format!("{field}.static_friction_range"), self.static_friction_range, rng)?,
                    draw(&format!("{field}.dynamic_friction_range"), self.dynamic_friction_range, rng)?,
                    draw(&format!("{field}.restitution_range"), self.restitution_range, rng)?,
                ])
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, pair) in [
            ("static_friction_range", self.static_friction_range),
            ("dynamic_friction_range", self.dynamic_friction_range),
            ("restitution_range", self.restitution_range),
        ] {
            let field = format!("domain_rand.physics_material.{name}");
            check::ordered_pair(&field, pair)?;
            check::non_negative(&field, pair.0)?;
        }
        check::positive("domain_rand.physics_material.num_buckets", self.num_buckets)
    }
}

// ---------------------------------------------------------------------------
// AddRigidBodyMassCfg
// ---------------------------------------------------------------------------

/// How a drawn mass sample combines with the nominal mass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassOperation {
    /// `nominal + sample`.
    #[default]
    Add,
    /// `nominal * sample`.
    Scale,
    /// `sample`.
    Abs,
}

/// Perturbs the mass of selected bodies on startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddRigidBodyMassCfg {
    pub enable: bool,
    /// Body name patterns. Must select at least one body when enabled.
    pub body_names: Vec<String>,
    pub mass_distribution_params: (f32, f32),
    pub operation: MassOperation,
}

impl Default for AddRigidBodyMassCfg {
    fn default() -> Self {
        Self {
            enable: true,
            body_names: Vec::new(),
            mass_distribution_params: (-5.0, 5.0),
            operation: MassOperation::Add,
        }
    }
}

impl AddRigidBodyMassCfg {
    /// Randomized mass for a body of `nominal` kg. Disabled events return
    /// `nominal` unchanged.
    pub fn apply<R: Rng + ?Sized>(&self, nominal: f32, rng: &mut R) -> Result<f32, ConfigError> {
        if !self.enable {
            return Ok(nominal);
        }
        let sample = draw(
            "domain_rand.add_rigid_body_mass.mass_distribution_params",
            self.mass_distribution_params,
            rng,
        )?;
        let mass = match self.operation {
            MassOperation::Add => nominal + sample,
            MassOperation::Scale => nominal * sample,
            MassOperation::Abs => sample,
        };
        Ok(mass.max(MIN_MASS))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = "domain_rand.add_rigid_body_mass.mass_distribution_params";
        check::ordered_pair(field, self.mass_distribution_params)?;
        if self.operation == MassOperation::Scale {
            check::non_negative(field, self.mass_distribution_params.0)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reset events
// ---------------------------------------------------------------------------

/// Root pose and twist offsets applied on reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetBaseCfg {
    pub pose_range: AxisRanges,
    pub velocity_range: AxisRanges,
}

impl Default for ResetBaseCfg {
    #[allow(clippy::approx_constant)]
    fn default() -> Self {
        Self {
            pose_range: AxisRanges {
                x: Some((-0.5, 0.5)),
                y: Some((-0.5, 0.5)),
                yaw: Some((-3.14, 3.14)),
                ..AxisRanges::default()
            },
            velocity_range: AxisRanges::all((-0.5, 0.5)),
        }
    }
}

/// Joint state on reset, as multiples of the default joint state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetRobotJointsCfg {
    pub position_range: (f32, f32),
    pub velocity_range: (f32, f32),
}

impl Default for ResetRobotJointsCfg {
    fn default() -> Self {
        Self {
            position_range: (0.5, 1.5),
            velocity_range: (0.0, 0.0),
        }
    }
}

impl ResetRobotJointsCfg {
    /// Scale each default position by an independent factor.
    pub fn apply<R: Rng + ?Sized>(&self, default_pos: &[f32], rng: &mut R) -> Result<Vec<f32>, ConfigError> {
        default_pos
            .iter()
            .map(|p| Ok(p * draw("domain_rand.reset_robot_joints.position_range", self.position_range, rng)?))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Interval events
// ---------------------------------------------------------------------------

/// Random velocity kicks at random intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushRobotCfg {
    pub enable: bool,
    /// Seconds between pushes.
    pub push_interval_s: (f32, f32),
    pub velocity_range: AxisRanges,
}

impl Default for PushRobotCfg {
    fn default() -> Self {
        Self {
            enable: true,
            push_interval_s: (10.0, 15.0),
            velocity_range: AxisRanges {
                x: Some((-0.5, 0.5)),
                y: Some((-0.5, 0.5)),
                ..AxisRanges::default()
            },
        }
    }
}

impl PushRobotCfg {
    /// Seconds until the next push.
    pub fn next_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f32, ConfigError> {
        draw("domain_rand.push_robot.push_interval_s", self.push_interval_s, rng)
    }
}

/// Delays actions by a whole number of control steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionDelayCfg {
    pub enable: bool,
    pub max_delay: u32,
    pub min_delay: u32,
}

impl Default for ActionDelayCfg {
    fn default() -> Self {
        Self {
            enable: false,
            max_delay: 5,
            min_delay: 0,
        }
    }
}

impl ActionDelayCfg {
    /// Delay in control steps. Zero when disabled.
    pub fn sample_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if !self.enable || self.max_delay <= self.min_delay {
            return if self.enable { self.min_delay } else { 0 };
        }
        rng.gen_range(self.min_delay..=self.max_delay)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_delay > self.max_delay {
            return Err(ConfigError::invalid(
                "domain_rand.action_delay",
                format!("min_delay ({}) > max_delay ({})", self.min_delay, self.max_delay),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
