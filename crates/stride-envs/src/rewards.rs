//! Weighted reward terms.
//!
//! A [`RewardCfg`] is a set of named [`RewardTermCfg`]s. Each term names one
//! of the reward functions known to the training side ([`RewardFn`]), a
//! weight, and the parameters the function takes. Scene entities in the
//! parameters select bodies or joints by pattern and are resolved against
//! the robot when the environment is validated.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use stride_core::check;
use stride_core::error::ConfigError;
use stride_core::pattern::NameSelector;
use tracing::debug;

/// Scene entity naming the robot articulation.
pub const ROBOT_ENTITY: &str = "robot";
/// Scene entity naming the contact sensor attached to every robot body.
pub const CONTACT_SENSOR_ENTITY: &str = "contact_sensor";

// ---------------------------------------------------------------------------
// RewardFn
// ---------------------------------------------------------------------------

/// Intended sign of a term's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    /// Rewards desired behavior; weight should be positive.
    Tracking,
    /// Penalizes undesired behavior; weight should be negative.
    Penalty,
}

/// Reward functions a term can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardFn {
    TrackLinVelXyYawFrameExp,
    TrackAngVelZWorldExp,
    LinVelZL2,
    AngVelXyL2,
    Energy,
    JointAccL2,
    ActionRateL2,
    UndesiredContacts,
    Fly,
    FlatOrientationL2,
    IsTerminated,
    FeetAirTimePositiveBiped,
    FeetSlide,
    BodyForce,
    FeetTooNearHumanoid,
    FeetStumble,
    JointPosLimits,
    JointDeviationL1,
}

impl RewardFn {
    pub const ALL: [Self; 18] = [
        Self::TrackLinVelXyYawFrameExp,
        Self::TrackAngVelZWorldExp,
        Self::LinVelZL2,
        Self::AngVelXyL2,
        Self::Energy,
        Self::JointAccL2,
        Self::ActionRateL2,
        Self::UndesiredContacts,
        Self::Fly,
        Self::FlatOrientationL2,
        Self::IsTerminated,
        Self::FeetAirTimePositiveBiped,
        Self::FeetSlide,
        Self::BodyForce,
        Self::FeetTooNearHumanoid,
        Self::FeetStumble,
        Self::JointPosLimits,
        Self::JointDeviationL1,
    ];

    /// Serialized name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::TrackLinVelXyYawFrameExp => "track_lin_vel_xy_yaw_frame_exp",
            Self::TrackAngVelZWorldExp => "track_ang_vel_z_world_exp",
            Self::LinVelZL2 => "lin_vel_z_l2",
            Self::AngVelXyL2 => "ang_vel_xy_l2",
            Self::Energy => "energy",
            Self::JointAccL2 => "joint_acc_l2",
            Self::ActionRateL2 => "action_rate_l2",
            Self::UndesiredContacts => "undesired_contacts",
            Self::Fly => "fly",
            Self::FlatOrientationL2 => "flat_orientation_l2",
            Self::IsTerminated => "is_terminated",
            Self::FeetAirTimePositiveBiped => "feet_air_time_positive_biped",
            Self::FeetSlide => "feet_slide",
            Self::BodyForce => "body_force",
            Self::FeetTooNearHumanoid => "feet_too_near_humanoid",
            Self::FeetStumble => "feet_stumble",
            Self::JointPosLimits => "joint_pos_limits",
            Self::JointDeviationL1 => "joint_deviation_l1",
        }
    }

    pub const fn kind(self) -> RewardKind {
        match self {
            Self::TrackLinVelXyYawFrameExp
            | Self::TrackAngVelZWorldExp
            | Self::FeetAirTimePositiveBiped => RewardKind::Tracking,
            _ => RewardKind::Penalty,
        }
    }

    /// Parameters the function cannot run without, and their kinds.
    pub const fn required_params(self) -> &'static [(&'static str, ParamKind)] {
        use ParamKind::{Entity, Number};
        match self {
            Self::TrackLinVelXyYawFrameExp | Self::TrackAngVelZWorldExp => &[("std", Number)],
            Self::UndesiredContacts | Self::Fly | Self::FeetAirTimePositiveBiped => {
                &[("sensor_cfg", Entity), ("threshold", Number)]
            }
            Self::FeetSlide => &[("sensor_cfg", Entity), ("asset_cfg", Entity)],
            Self::BodyForce | Self::FeetStumble => &[("sensor_cfg", Entity)],
            Self::FeetTooNearHumanoid | Self::JointDeviationL1 => &[("asset_cfg", Entity)],
            _ => &[],
        }
    }
}

impl fmt::Display for RewardFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// SceneEntityCfg
// ---------------------------------------------------------------------------

/// A scene entity plus an optional body or joint subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneEntityCfg {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joint_names: Vec<String>,
}

impl SceneEntityCfg {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body_names: Vec::new(),
            joint_names: Vec::new(),
        }
    }

    pub fn robot() -> Self {
        Self::new(ROBOT_ENTITY)
    }

    pub fn contact_sensor() -> Self {
        Self::new(CONTACT_SENSOR_ENTITY)
    }

    #[must_use]
    pub fn with_bodies<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.body_names = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_joints<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.joint_names = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve the body and joint subsets. An empty list means the whole
    /// entity and contributes no names.
    fn resolve<B: AsRef<str>, J: AsRef<str>>(
        &self,
        field: &str,
        bodies: &[B],
        joints: &[J],
    ) -> Result<EntitySelection, ConfigError> {
        if self.name != ROBOT_ENTITY && self.name != CONTACT_SENSOR_ENTITY {
            return Err(ConfigError::invalid(
                format!("{field}.name"),
                format!("unknown scene entity '{}'", self.name),
            ));
        }
        if self.name == CONTACT_SENSOR_ENTITY && !self.joint_names.is_empty() {
            return Err(ConfigError::Incompatible(format!(
                "{field}: contact sensors have no joints"
            )));
        }
        let mut selection = EntitySelection::default();
        if !self.body_names.is_empty() {
            let selector = NameSelector::new(format!("{field}.body_names"), &self.body_names)?;
            if !bodies.is_empty() {
                selection.bodies = selector
                    .resolve_names(bodies)?
                    .into_iter()
                    .map(str::to_string)
                    .collect();
            }
        }
        if !self.joint_names.is_empty() {
            let selector = NameSelector::new(format!("{field}.joint_names"), &self.joint_names)?;
            selection.joints = selector
                .resolve_names(joints)?
                .into_iter()
                .map(str::to_string)
                .collect();
        }
        Ok(selection)
    }
}

#[derive(Debug, Default)]
struct EntitySelection {
    bodies: Vec<String>,
    joints: Vec<String>,
}

// ---------------------------------------------------------------------------
// RewardParam / RewardTermCfg
// ---------------------------------------------------------------------------

/// A reward-function argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RewardParam {
    Number(f32),
    Entity(SceneEntityCfg),
}

impl RewardParam {
    pub const fn kind(&self) -> ParamKind {
        match self {
            Self::Number(_) => ParamKind::Number,
            Self::Entity(_) => ParamKind::Entity,
        }
    }
}

/// Shape a reward parameter takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Entity,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "a number",
            Self::Entity => "a scene entity",
        })
    }
}

impl From<f32> for RewardParam {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<SceneEntityCfg> for RewardParam {
    fn from(value: SceneEntityCfg) -> Self {
        Self::Entity(value)
    }
}

/// One weighted reward term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTermCfg {
    pub func: RewardFn,
    pub weight: f32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, RewardParam>,
}

impl RewardTermCfg {
    pub const fn new(func: RewardFn, weight: f32) -> Self {
        Self {
            func,
            weight,
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<RewardParam>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Numeric parameter, if present.
    pub fn number(&self, name: &str) -> Option<f32> {
        match self.params.get(name) {
            Some(RewardParam::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Entity parameter, if present.
    pub fn entity(&self, name: &str) -> Option<&SceneEntityCfg> {
        match self.params.get(name) {
            Some(RewardParam::Entity(e)) => Some(e),
            _ => None,
        }
    }

    fn validate<B: AsRef<str>, J: AsRef<str>>(
        &self,
        field: &str,
        bodies: &[B],
        joints: &[J],
    ) -> Result<ResolvedRewardTerm, ConfigError> {
        check::finite(&format!("{field}.weight"), self.weight)?;
        for &(required, kind) in self.func.required_params() {
            let Some(param) = self.params.get(required) else {
                return Err(ConfigError::MissingField(format!("{field}.params.{required}")));
            };
            if param.kind() != kind {
                return Err(ConfigError::invalid(
                    format!("{field}.params.{required}"),
                    format!("{} needs {kind}, got {}", self.func, param.kind()),
                ));
            }
        }
        let mut resolved = ResolvedRewardTerm {
            func: self.func,
            weight: self.weight,
            bodies: Vec::new(),
            joints: Vec::new(),
        };
        for (name, param) in &self.params {
            let param_field = format!("{field}.params.{name}");
            match param {
                RewardParam::Number(v) => check::finite(&param_field, *v)?,
                RewardParam::Entity(entity) => {
                    let selection = entity.resolve(&param_field, bodies, joints)?;
                    resolved.bodies.extend(selection.bodies);
                    resolved.joints.extend(selection.joints);
                }
            }
        }
        resolved.bodies.sort();
        resolved.bodies.dedup();
        resolved.joints.sort();
        resolved.joints.dedup();
        Ok(resolved)
    }
}

/// A term after its entity patterns have been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRewardTerm {
    pub func: RewardFn,
    pub weight: f32,
    /// Bodies selected by the term's entity parameters.
    pub bodies: Vec<String>,
    /// Joints selected by the term's entity parameters.
    pub joints: Vec<String>,
}

// ---------------------------------------------------------------------------
// RewardCfg
// ---------------------------------------------------------------------------

/// A weight whose sign disagrees with its function's [`RewardKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSignLint {
    pub term: String,
    pub func: RewardFn,
    pub weight: f32,
    pub expected: RewardKind,
}

impl fmt::Display for WeightSignLint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let want = match self.expected {
            RewardKind::Tracking => "positive",
            RewardKind::Penalty => "negative",
        };
        write!(
            f,
            "{} ({}): weight {} should be {want}",
            self.term, self.func, self.weight
        )
    }
}

/// Named reward terms, serialized in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardCfg {
    terms: BTreeMap<String, RewardTermCfg>,
}

impl RewardCfg {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_term(mut self, name: impl Into<String>, term: RewardTermCfg) -> Self {
        self.insert(name, term);
        self
    }

    /// Add or replace a term.
    pub fn insert(&mut self, name: impl Into<String>, term: RewardTermCfg) -> Option<RewardTermCfg> {
        self.terms.insert(name.into(), term)
    }

    pub fn remove(&mut self, name: &str) -> Option<RewardTermCfg> {
        self.terms.remove(name)
    }

    pub fn term(&self, name: &str) -> Option<&RewardTermCfg> {
        self.terms.get(name)
    }

    pub fn term_mut(&mut self, name: &str) -> Option<&mut RewardTermCfg> {
        self.terms.get_mut(name)
    }

    /// Replace the weight of an existing term.
    pub fn set_weight(&mut self, name: &str, weight: f32) -> Result<(), ConfigError> {
        let term = self
            .terms
            .get_mut(name)
            .ok_or_else(|| ConfigError::MissingField(format!("reward.{name}")))?;
        term.weight = weight;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RewardTermCfg)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Terms whose weight sign contradicts their function. Zero weights
    /// disable a term and are never reported.
    pub fn lint_weight_signs(&self) -> Vec<WeightSignLint> {
        self.iter()
            .filter(|(_, term)| match term.func.kind() {
                RewardKind::Tracking => term.weight < 0.0,
                RewardKind::Penalty => term.weight > 0.0,
            })
            .map(|(name, term)| WeightSignLint {
                term: name.to_string(),
                func: term.func,
                weight: term.weight,
                expected: term.func.kind(),
            })
            .collect()
    }

    /// Check every term and resolve its entity patterns.
    ///
    /// Body patterns are only resolved when `bodies` is non-empty.
    pub fn validate<B: AsRef<str>, J: AsRef<str>>(
        &self,
        bodies: &[B],
        joints: &[J],
    ) -> Result<BTreeMap<String, ResolvedRewardTerm>, ConfigError> {
        if self.terms.is_empty() {
            return Err(ConfigError::MissingField("reward".into()));
        }
        let mut resolved = BTreeMap::new();
        for (name, term) in &self.terms {
            let term = term.validate(&format!("reward.{name}"), bodies, joints)?;
            resolved.insert(name.clone(), term);
        }
        debug!(terms = resolved.len(), "resolved reward terms");
        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BODIES: [&str; 3] = ["base_link", "left_foot_link", "right_foot_link"];
    const JOINTS: [&str; 2] = ["left_knee_joint", "right_knee_joint"];

    fn feet() -> SceneEntityCfg {
        SceneEntityCfg::contact_sensor().with_bodies([".*foot.*"])
    }

    fn sample() -> RewardCfg {
        RewardCfg::new()
            .with_term(
                "track",
                RewardTermCfg::new(RewardFn::TrackLinVelXyYawFrameExp, 1.0).with_param("std", 0.5),
            )
            .with_term(
                "undesired_contacts",
                RewardTermCfg::new(RewardFn::UndesiredContacts, -1.0)
                    .with_param("sensor_cfg", SceneEntityCfg::contact_sensor().with_bodies(["!.*foot.*"]))
                    .with_param("threshold", 1.0),
            )
            .with_term(
                "knees",
                RewardTermCfg::new(RewardFn::JointDeviationL1, -0.05)
                    .with_param("asset_cfg", SceneEntityCfg::robot().with_joints([".*_knee.*"])),
            )
    }

    #[test]
    fn serialized_names_match() {
        for func in RewardFn::ALL {
            let value = serde_json::to_value(func).unwrap();
            assert_eq!(value, serde_json::Value::String(func.name().into()), "{func:?}");
        }
    }

    #[test]
    fn validate_resolves_entities() {
        let resolved = sample().validate(&BODIES, &JOINTS).unwrap();
        assert_eq!(resolved["undesired_contacts"].bodies, vec!["base_link".to_string()]);
        assert_eq!(resolved["knees"].joints.len(), 2);
        assert!(resolved["track"].bodies.is_empty());
    }

    #[test]
    fn missing_required_param() {
        let cfg = RewardCfg::new().with_term(
            "fly",
            RewardTermCfg::new(RewardFn::Fly, -1.0).with_param("sensor_cfg", feet()),
        );
        let err = cfg.validate(&BODIES, &JOINTS).unwrap_err();
        assert_eq!(err.field(), Some("reward.fly.params.threshold"));
    }

    #[test]
    fn required_param_of_wrong_kind() {
        let cfg = RewardCfg::new().with_term(
            "stumble",
            RewardTermCfg::new(RewardFn::FeetStumble, -2.0).with_param("sensor_cfg", 1.0),
        );
        let err = cfg.validate(&BODIES, &JOINTS).unwrap_err();
        assert_eq!(err.field(), Some("reward.stumble.params.sensor_cfg"));
        assert!(err.to_string().contains("needs a scene entity"));

        let cfg = RewardCfg::new().with_term(
            "fly",
            RewardTermCfg::new(RewardFn::Fly, -1.0)
                .with_param("sensor_cfg", feet())
                .with_param("threshold", feet()),
        );
        let err = cfg.validate(&BODIES, &JOINTS).unwrap_err();
        assert_eq!(err.field(), Some("reward.fly.params.threshold"));
    }

    #[test]
    fn body_typo_is_unresolved() {
        let cfg = RewardCfg::new().with_term(
            "stumble",
            RewardTermCfg::new(RewardFn::FeetStumble, -2.0)
                .with_param("sensor_cfg", SceneEntityCfg::contact_sensor().with_bodies([".*toe.*"])),
        );
        let err = cfg.validate(&BODIES, &JOINTS).unwrap_err();
        assert_eq!(err.field(), Some("reward.stumble.params.sensor_cfg.body_names"));
    }

    #[test]
    fn unknown_entity_rejected() {
        let cfg = RewardCfg::new().with_term(
            "stumble",
            RewardTermCfg::new(RewardFn::FeetStumble, -2.0)
                .with_param("sensor_cfg", SceneEntityCfg::new("lidar")),
        );
        let err = cfg.validate(&BODIES, &JOINTS).unwrap_err();
        assert_eq!(err.field(), Some("reward.stumble.params.sensor_cfg.name"));
    }

    #[test]
    fn empty_reward_is_missing() {
        assert!(matches!(
            RewardCfg::new().validate(&BODIES, &JOINTS),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn set_weight_and_lint() {
        let mut cfg = sample();
        assert!(cfg.lint_weight_signs().is_empty());
        cfg.set_weight("track", -1.0).unwrap();
        cfg.set_weight("knees", 0.0).unwrap();
        let lints = cfg.lint_weight_signs();
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].term, "track");
        assert_eq!(lints[0].expected, RewardKind::Tracking);
        assert!(lints[0].to_string().contains("should be positive"));
        assert!(cfg.set_weight("nope", 1.0).is_err());
    }

    #[test]
    fn toml_term_with_entity_and_number() {
        let cfg: RewardCfg = toml::from_str(
            r#"
            [feet_force]
            func = "body_force"
            weight = -3e-3

            [feet_force.params]
            threshold = 500
            max_reward = 400

            [feet_force.params.sensor_cfg]
            name = "contact_sensor"
            body_names = [".*foot.*"]
            "#,
        )
        .unwrap();
        let term = cfg.term("feet_force").unwrap();
        assert_eq!(term.func, RewardFn::BodyForce);
        assert_eq!(term.number("threshold"), Some(500.0));
        assert_eq!(term.entity("sensor_cfg"), Some(&feet()));
    }
}
