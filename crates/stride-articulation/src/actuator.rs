//! Implicit (PD-in-the-solver) actuator groups.

use std::fmt;

use serde::{Deserialize, Serialize};
use stride_core::check;
use stride_core::error::ConfigError;
use stride_core::pattern::PatternValue;

/// One of the per-joint drive settings an actuator group can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gain {
    EffortLimit,
    VelocityLimit,
    Stiffness,
    Damping,
    Armature,
}

impl Gain {
    pub const ALL: [Self; 5] = [
        Self::EffortLimit,
        Self::VelocityLimit,
        Self::Stiffness,
        Self::Damping,
        Self::Armature,
    ];

    /// Config field holding this gain.
    pub const fn field(self) -> &'static str {
        match self {
            Self::EffortLimit => "effort_limit_sim",
            Self::VelocityLimit => "velocity_limit_sim",
            Self::Stiffness => "stiffness",
            Self::Damping => "damping",
            Self::Armature => "armature",
        }
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// A named set of joints sharing drive gains and limits.
///
/// Every gain is optional; `None` leaves the asset's own value in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImplicitActuatorCfg {
    /// Joint name patterns claimed by this group.
    pub joint_names_expr: Vec<String>,
    /// Maximum joint effort (Nm or N).
    #[serde(default)]
    pub effort_limit_sim: Option<PatternValue<f32>>,
    /// Maximum joint velocity (rad/s or m/s).
    #[serde(default)]
    pub velocity_limit_sim: Option<PatternValue<f32>>,
    /// PD position gain.
    #[serde(default)]
    pub stiffness: Option<PatternValue<f32>>,
    /// PD velocity gain.
    #[serde(default)]
    pub damping: Option<PatternValue<f32>>,
    /// Reflected rotor inertia added to the joint.
    #[serde(default)]
    pub armature: Option<PatternValue<f32>>,
}

impl ImplicitActuatorCfg {
    /// Create a group claiming `patterns`, with no gains set.
    pub fn new<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
        Self {
            joint_names_expr: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_effort_limit(mut self, value: PatternValue<f32>) -> Self {
        self.effort_limit_sim = Some(value);
        self
    }

    #[must_use]
    pub fn with_velocity_limit(mut self, value: PatternValue<f32>) -> Self {
        self.velocity_limit_sim = Some(value);
        self
    }

    #[must_use]
    pub fn with_stiffness(mut self, value: PatternValue<f32>) -> Self {
        self.stiffness = Some(value);
        self
    }

    #[must_use]
    pub fn with_damping(mut self, value: PatternValue<f32>) -> Self {
        self.damping = Some(value);
        self
    }

    #[must_use]
    pub fn with_armature(mut self, value: PatternValue<f32>) -> Self {
        self.armature = Some(value);
        self
    }

    pub fn gain(&self, gain: Gain) -> Option<&PatternValue<f32>> {
        match gain {
            Gain::EffortLimit => self.effort_limit_sim.as_ref(),
            Gain::VelocityLimit => self.velocity_limit_sim.as_ref(),
            Gain::Stiffness => self.stiffness.as_ref(),
            Gain::Damping => self.damping.as_ref(),
            Gain::Armature => self.armature.as_ref(),
        }
    }

    /// Every gain that is set, in [`Gain::ALL`] order.
    pub fn gains(&self) -> impl Iterator<Item = (Gain, &PatternValue<f32>)> {
        Gain::ALL
            .into_iter()
            .filter_map(|gain| self.gain(gain).map(|v| (gain, v)))
    }

    /// Range checks only; pattern resolution happens in
    /// [`ArticulationCfg::resolve`](crate::ArticulationCfg::resolve).
    /// `field` is this group's path, e.g. `actuators.legs`.
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.joint_names_expr.is_empty() {
            return Err(ConfigError::MissingField(format!("{field}.joint_names_expr")));
        }
        for (gain, value) in self.gains() {
            for v in value.values() {
                check::non_negative(&format!("{field}.{gain}"), v)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn knees() -> ImplicitActuatorCfg {
        ImplicitActuatorCfg::new([".*_knee_joint"])
            .with_stiffness(PatternValue::uniform(40.0))
            .with_damping(PatternValue::per_pattern([(".*_knee_joint", 1.25)]))
    }

    #[test]
    fn builder_sets_only_requested_gains() {
        let cfg = knees();
        let set: Vec<_> = cfg.gains().map(|(g, _)| g).collect();
        assert_eq!(set, vec![Gain::Stiffness, Gain::Damping]);
        assert!(cfg.gain(Gain::Armature).is_none());
        assert!(cfg.effort_limit_sim.is_none());
    }

    #[test]
    fn validate_ok() {
        assert!(knees().validate("actuators.legs").is_ok());
    }

    #[test]
    fn validate_rejects_negative_gain() {
        let cfg = knees().with_armature(PatternValue::uniform(-0.01));
        let err = cfg.validate("actuators.legs").unwrap_err();
        assert_eq!(err.field(), Some("actuators.legs.armature"));
    }

    #[test]
    fn validate_rejects_negative_per_pattern_limit() {
        let cfg = knees().with_effort_limit(PatternValue::per_pattern([
            (".*_knee_joint", 20.0),
            (".*_hip_joint", -1.0),
        ]));
        let err = cfg.validate("actuators.legs").unwrap_err();
        assert_eq!(err.field(), Some("actuators.legs.effort_limit_sim"));
    }

    #[test]
    fn validate_rejects_empty_group() {
        let cfg = ImplicitActuatorCfg::default();
        assert!(matches!(
            cfg.validate("actuators.empty"),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn toml_mixed_scalar_and_table_gains() {
        let toml_str = r#"
            joint_names_expr = [".*_ankle_joint"]
            stiffness = 35.0
            damping = 0.25
            armature = 0.01

            [effort_limit_sim]
            ".*_ankle_joint" = 12.0
        "#;
        let cfg: ImplicitActuatorCfg = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.stiffness, Some(PatternValue::Uniform(35.0)));
        assert!(matches!(cfg.effort_limit_sim, Some(PatternValue::PerPattern(_))));
        assert!(cfg.velocity_limit_sim.is_none());
    }
}
