//! Domain randomization for sim-to-real transfer.
//!
//! [`DomainRandCfg`] groups the startup, reset and interval events that
//! perturb friction, body masses, initial state and external pushes.
//! Sampling is deterministic given the RNG, so seeding with a
//! `rand_chacha` generator reproduces a run.

pub mod events;
pub mod ranges;

use serde::{Deserialize, Serialize};
use stride_core::error::ConfigError;
use stride_core::pattern::NameSelector;
use tracing::{debug, warn};

pub use events::{
    ActionDelayCfg, AddRigidBodyMassCfg, AxisRanges, MassOperation, PhysicsMaterialCfg,
    PushRobotCfg, ResetBaseCfg, ResetRobotJointsCfg,
};
pub use ranges::{RandomizationRange, RangeError};

// ---------------------------------------------------------------------------
// DomainRandCfg
// ---------------------------------------------------------------------------

/// All randomization events of an environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainRandCfg {
    pub physics_material: PhysicsMaterialCfg,
    pub add_rigid_body_mass: AddRigidBodyMassCfg,
    pub reset_base: ResetBaseCfg,
    pub reset_robot_joints: ResetRobotJointsCfg,
    pub push_robot: PushRobotCfg,
    pub action_delay: ActionDelayCfg,
}

impl DomainRandCfg {
    /// Builder: set the bodies whose mass is randomized.
    #[must_use]
    pub fn with_mass_bodies<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.add_rigid_body_mass.body_names = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Range checks, plus body resolution for the mass event.
    ///
    /// Enabled mass randomization needs body patterns. They are resolved
    /// against `robot_bodies` when the robot declares any; otherwise only
    /// their syntax is checked.
    pub fn validate<S: AsRef<str>>(&self, robot_bodies: &[S]) -> Result<(), ConfigError> {
        self.physics_material.validate()?;
        self.add_rigid_body_mass.validate()?;
        self.reset_base.pose_range.validate("domain_rand.reset_base.pose_range")?;
        self.reset_base
            .velocity_range
            .validate("domain_rand.reset_base.velocity_range")?;
        stride_core::check::ordered_pair(
            "domain_rand.reset_robot_joints.position_range",
            self.reset_robot_joints.position_range,
        )?;
        stride_core::check::ordered_pair(
            "domain_rand.reset_robot_joints.velocity_range",
            self.reset_robot_joints.velocity_range,
        )?;
        stride_core::check::ordered_pair(
            "domain_rand.push_robot.push_interval_s",
            self.push_robot.push_interval_s,
        )?;
        stride_core::check::non_negative(
            "domain_rand.push_robot.push_interval_s",
            self.push_robot.push_interval_s.0,
        )?;
        self.push_robot
            .velocity_range
            .validate("domain_rand.push_robot.velocity_range")?;
        self.action_delay.validate()?;

        let mass = &self.add_rigid_body_mass;
        if mass.enable {
            let field = "domain_rand.add_rigid_body_mass.body_names";
            if mass.body_names.is_empty() {
                return Err(ConfigError::MissingField(field.into()));
            }
            let selector = NameSelector::new(field, &mass.body_names)?;
            if robot_bodies.is_empty() {
                warn!(field, "robot declares no bodies; mass randomization targets not checked");
            } else {
                let ids = selector.resolve(robot_bodies)?;
                debug!(bodies = ids.len(), "mass randomization targets resolved");
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

    const BODIES: [&str; 3] = ["base_link", "left_foot_link", "right_foot_link"];

    #[test]
    fn defaults_need_mass_bodies() {
        let cfg = DomainRandCfg::default();
        assert!(matches!(
            cfg.validate(&BODIES),
            Err(ConfigError::MissingField(_))
        ));
        assert!(cfg.with_mass_bodies([".*base.*"]).validate(&BODIES).is_ok());
    }

    #[test]
    fn disabled_mass_skips_body_check() {
        let mut cfg = DomainRandCfg::default();
        cfg.add_rigid_body_mass.enable = false;
        assert!(cfg.validate(&BODIES).is_ok());
    }

    #[test]
    fn mass_body_typo_is_unresolved() {
        let cfg = DomainRandCfg::default().with_mass_bodies([".*torso.*"]);
        let err = cfg.validate(&BODIES).unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedPattern { .. }));
        assert_eq!(err.field(), Some("domain_rand.add_rigid_body_mass.body_names"));
    }

    #[test]
    fn bodiless_robot_only_checks_syntax() {
        let none: [&str; 0] = [];
        let cfg = DomainRandCfg::default().with_mass_bodies([".*base.*"]);
        assert!(cfg.validate(&none).is_ok());
        let bad = DomainRandCfg::default().with_mass_bodies(["(unclosed"]);
        assert!(matches!(
            bad.validate(&none),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn reversed_friction_rejected() {
        let mut cfg = DomainRandCfg::default().with_mass_bodies([".*base.*"]);
        cfg.physics_material.static_friction_range = (1.0, 0.6);
        let err = cfg.validate(&BODIES).unwrap_err();
        assert_eq!(
            err.field(),
            Some("domain_rand.physics_material.static_friction_range")
        );
    }

    #[test]
    fn toml_partial_overrides_defaults() {
        let cfg: DomainRandCfg = toml::from_str(
            r#"
            [add_rigid_body_mass]
            enable = true
            body_names = [".*base.*"]
            mass_distribution_params = [-1.0, 3.0]
            operation = "scale"

            [action_delay]
            enable = true
            max_delay = 3
            min_delay = 1
            "#,
        )
        .unwrap();
        assert_eq!(cfg.add_rigid_body_mass.operation, MassOperation::Scale);
        assert_eq!(cfg.physics_material, PhysicsMaterialCfg::default());
        assert_eq!(cfg.action_delay.max_delay, 3);
        // Negative scale factors are rejected.
        assert!(cfg.validate(&BODIES).is_err());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn cfg_is_send_sync() {
        assert_send_sync::<DomainRandCfg>();
    }
}
