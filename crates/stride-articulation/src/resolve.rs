//! Joint-level view of an [`ArticulationCfg`].
//!
//! Resolution matches every actuator group's patterns against the declared
//! joints once, up front, so that typos surface before anything is spawned.

use std::collections::BTreeMap;

use stride_core::error::ConfigError;
use stride_core::pattern::NameSelector;
use tracing::{debug, warn};

use crate::actuator::Gain;
use crate::types::ArticulationCfg;

// ---------------------------------------------------------------------------
// ResolvedJoint
// ---------------------------------------------------------------------------

/// Effective settings of one joint after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJoint {
    pub name: String,
    pub init_pos: f32,
    pub init_vel: f32,
    /// Owning actuator group, `None` if no group claims the joint.
    pub group: Option<String>,
    pub effort_limit: Option<f32>,
    pub velocity_limit: Option<f32>,
    pub stiffness: Option<f32>,
    pub damping: Option<f32>,
    pub armature: Option<f32>,
}

impl ResolvedJoint {
    fn new(name: &str, init_pos: f32, init_vel: f32) -> Self {
        Self {
            name: name.to_string(),
            init_pos,
            init_vel,
            group: None,
            effort_limit: None,
            velocity_limit: None,
            stiffness: None,
            damping: None,
            armature: None,
        }
    }

    pub const fn gain(&self, gain: Gain) -> Option<f32> {
        match gain {
            Gain::EffortLimit => self.effort_limit,
            Gain::VelocityLimit => self.velocity_limit,
            Gain::Stiffness => self.stiffness,
            Gain::Damping => self.damping,
            Gain::Armature => self.armature,
        }
    }

    fn gain_mut(&mut self, gain: Gain) -> &mut Option<f32> {
        match gain {
            Gain::EffortLimit => &mut self.effort_limit,
            Gain::VelocityLimit => &mut self.velocity_limit,
            Gain::Stiffness => &mut self.stiffness,
            Gain::Damping => &mut self.damping,
            Gain::Armature => &mut self.armature,
        }
    }
}

// ---------------------------------------------------------------------------
// ResolvedArticulation
// ---------------------------------------------------------------------------

/// Per-joint table produced by [`ArticulationCfg::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArticulation {
    /// One entry per joint, in declaration order.
    pub joints: Vec<ResolvedJoint>,
    /// Joints not claimed by any actuator group.
    pub unactuated: Vec<String>,
    /// Joint indices per actuator group.
    pub groups: BTreeMap<String, Vec<usize>>,
}

impl ResolvedArticulation {
    pub fn joint(&self, name: &str) -> Option<&ResolvedJoint> {
        self.joints.iter().find(|j| j.name == name)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Joints of one actuator group, in declaration order.
    pub fn group_joints(&self, group: &str) -> Vec<&ResolvedJoint> {
        self.groups
            .get(group)
            .map(|ids| ids.iter().map(|&i| &self.joints[i]).collect())
            .unwrap_or_default()
    }

    pub fn is_fully_actuated(&self) -> bool {
        self.unactuated.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

impl ArticulationCfg {
    /// Resolve against the joints declared in `init_state.joint_pos`.
    pub fn resolve(&self) -> Result<ResolvedArticulation, ConfigError> {
        let names: Vec<String> = self.joint_names().into_iter().map(str::to_string).collect();
        self.resolve_against(&names)
    }

    /// Resolve against an explicit joint list, e.g. one read from the asset.
    ///
    /// # Errors
    ///
    /// - any range error from [`check_values`](Self::check_values);
    /// - [`ConfigError::MissingField`] when there are no joints;
    /// - [`ConfigError::UnresolvedPattern`] when an initial-state key, a
    ///   group pattern, or a per-pattern gain key matches no joint (gain keys
    ///   are matched only within their own group);
    /// - [`ConfigError::Incompatible`] when two groups claim the same joint.
    pub fn resolve_against<S: AsRef<str>>(&self, names: &[S]) -> Result<ResolvedArticulation, ConfigError> {
        self.check_values()?;
        if names.is_empty() {
            return Err(ConfigError::MissingField("init_state.joint_pos".into()));
        }

        let init_pos = self.init_state.joint_pos.resolve("init_state.joint_pos", names)?;
        let init_vel = self.init_state.joint_vel.resolve("init_state.joint_vel", names)?;
        let mut joints: Vec<ResolvedJoint> = names
            .iter()
            .zip(init_pos.iter().zip(&init_vel))
            .map(|(name, (pos, vel))| {
                ResolvedJoint::new(
                    name.as_ref(),
                    pos.copied().unwrap_or(0.0),
                    vel.copied().unwrap_or(0.0),
                )
            })
            .collect();

        let mut groups = BTreeMap::new();
        for (group_name, group) in &self.actuators {
            let field = format!("actuators.{group_name}");
            let selector = NameSelector::new(format!("{field}.joint_names_expr"), &group.joint_names_expr)?;
            let ids = selector.resolve(names)?;

            for &i in &ids {
                if let Some(owner) = &joints[i].group {
                    return Err(ConfigError::Incompatible(format!(
                        "joint '{}' is claimed by actuator groups '{owner}' and '{group_name}'",
                        joints[i].name
                    )));
                }
                joints[i].group = Some(group_name.clone());
            }

            let member_names: Vec<&str> = ids.iter().map(|&i| joints[i].name.as_str()).collect();
            let mut resolved_gains = Vec::new();
            for (gain, value) in group.gains() {
                resolved_gains.push((gain, value.resolve(&format!("{field}.{gain}"), &member_names)?));
            }
            for (gain, values) in resolved_gains {
                for (&i, v) in ids.iter().zip(values) {
                    *joints[i].gain_mut(gain) = v;
                }
            }

            debug!(group = %group_name, joints = ids.len(), "resolved actuator group");
            groups.insert(group_name.clone(), ids);
        }

        let unactuated: Vec<String> = joints
            .iter()
            .filter(|j| j.group.is_none())
            .map(|j| j.name.clone())
            .collect();
        if !unactuated.is_empty() {
            warn!(joints = ?unactuated, "joints not claimed by any actuator group");
        }

        Ok(ResolvedArticulation {
            joints,
            unactuated,
            groups,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
