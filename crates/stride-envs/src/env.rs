//! Environment configuration.
//!
//! [`BaseEnvCfg`] is the template every task starts from. Task constructors
//! clone it (or another task's config) and patch fields; nothing here knows
//! about particular robots.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stride_articulation::{ArticulationCfg, ResolvedArticulation};
use stride_core::check;
use stride_core::config::{SimCfg, load_toml};
use stride_core::error::ConfigError;
use stride_core::pattern::NameSelector;
use stride_domain_rand::DomainRandCfg;
use stride_terrain::TerrainGeneratorCfg;
use tracing::{debug, warn};

use crate::rewards::{RewardCfg, ResolvedRewardTerm};

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// Ground used by the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    /// Infinite flat plane.
    Plane,
    /// Tiles from `scene.terrain_generator`.
    #[default]
    Generator,
}

/// Upper bound on height-scan grid points.
pub const MAX_HEIGHT_SCAN_RAYS: usize = 1 << 16;

/// Ray-cast height map around a robot body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightScannerCfg {
    pub enable_height_scan: bool,
    /// Body the scanner is attached to.
    pub prim_body_name: String,
    /// Grid spacing (m).
    pub resolution: f32,
    /// Grid extent `(x, y)` (m).
    pub size: (f32, f32),
    pub debug_vis: bool,
    /// Per-episode vertical drift of the ray origins (m).
    pub drift_range: (f32, f32),
}

impl Default for HeightScannerCfg {
    fn default() -> Self {
        Self {
            enable_height_scan: false,
            prim_body_name: String::new(),
            resolution: 0.1,
            size: (1.6, 1.0),
            debug_vis: false,
            drift_range: (0.0, 0.0),
        }
    }
}

impl HeightScannerCfg {
    /// Rays in the scan grid, counting both edges.
    ///
    /// Fails when the grid exceeds [`MAX_HEIGHT_SCAN_RAYS`].
    pub fn num_rays(&self) -> Result<usize, ConfigError> {
        let too_dense = || {
            ConfigError::invalid(
                "scene.height_scanner.resolution",
                format!(
                    "{} over {:?} gives more than {MAX_HEIGHT_SCAN_RAYS} rays",
                    self.resolution, self.size
                ),
            )
        };
        let per_axis = |extent: f32| {
            let n = (extent / self.resolution).round();
            if !n.is_finite() || n < 0.0 || n >= MAX_HEIGHT_SCAN_RAYS as f32 {
                return None;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = n as usize;
            Some(n + 1)
        };
        per_axis(self.size.0)
            .zip(per_axis(self.size.1))
            .and_then(|(x, y)| x.checked_mul(y))
            .filter(|rays| *rays <= MAX_HEIGHT_SCAN_RAYS)
            .ok_or_else(too_dense)
    }

    fn validate<S: AsRef<str>>(&self, bodies: &[S]) -> Result<(), ConfigError> {
        check::positive("scene.height_scanner.resolution", self.resolution)?;
        check::positive("scene.height_scanner.size", self.size.0)?;
        check::positive("scene.height_scanner.size", self.size.1)?;
        self.num_rays()?;
        check::ordered_pair("scene.height_scanner.drift_range", self.drift_range)?;
        if self.enable_height_scan {
            check::non_empty("scene.height_scanner.prim_body_name", &self.prim_body_name)?;
        }
        if !self.prim_body_name.is_empty()
            && !bodies.is_empty()
            && !bodies.iter().any(|b| b.as_ref() == self.prim_body_name)
        {
            return Err(ConfigError::UnresolvedPattern {
                field: "scene.height_scanner.prim_body_name".into(),
                pattern: self.prim_body_name.clone(),
            });
        }
        Ok(())
    }
}

/// What is spawned and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseSceneCfg {
    pub height_scanner: HeightScannerCfg,
    pub robot: ArticulationCfg,
    pub terrain_type: TerrainType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terrain_generator: Option<TerrainGeneratorCfg>,
    pub max_episode_length_s: f32,
    pub num_envs: u32,
    pub env_spacing: f32,
    /// Highest curriculum row robots may start on.
    pub max_init_terrain_level: u32,
}

impl Default for BaseSceneCfg {
    fn default() -> Self {
        Self {
            height_scanner: HeightScannerCfg::default(),
            robot: ArticulationCfg::default(),
            terrain_type: TerrainType::Generator,
            terrain_generator: None,
            max_episode_length_s: 20.0,
            num_envs: 4096,
            env_spacing: 2.5,
            max_init_terrain_level: 5,
        }
    }
}

impl BaseSceneCfg {
    fn validate_terrain(&self) -> Result<(), ConfigError> {
        match (self.terrain_type, &self.terrain_generator) {
            (TerrainType::Generator, None) => {
                Err(ConfigError::MissingField("scene.terrain_generator".into()))
            }
            (TerrainType::Generator, Some(generator)) => {
                generator.validate().map_err(|e| e.with_prefix("scene"))?;
                if generator.curriculum && self.max_init_terrain_level >= generator.num_rows {
                    return Err(ConfigError::invalid(
                        "scene.max_init_terrain_level",
                        format!(
                            "{} (terrain has {} rows)",
                            self.max_init_terrain_level, generator.num_rows
                        ),
                    ));
                }
                Ok(())
            }
            (TerrainType::Plane, Some(_)) => {
                warn!("scene.terrain_generator is ignored for plane terrain");
                Ok(())
            }
            (TerrainType::Plane, None) => Ok(()),
        }
    }

    fn validate(&self) -> Result<ResolvedArticulation, ConfigError> {
        check::positive("scene.num_envs", self.num_envs)?;
        check::positive("scene.env_spacing", self.env_spacing)?;
        check::positive("scene.max_episode_length_s", self.max_episode_length_s)?;
        self.validate_terrain()?;
        self.height_scanner.validate(&self.robot.body_names)?;
        self.robot.resolve().map_err(|e| e.with_prefix("scene.robot"))
    }
}

// ---------------------------------------------------------------------------
// Robot behavior
// ---------------------------------------------------------------------------

/// Observation and termination settings tied to the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotCfg {
    pub actor_obs_history_length: u32,
    pub critic_obs_history_length: u32,
    /// Scale from policy output to joint position offset.
    pub action_scale: f32,
    /// Contact on any of these bodies ends the episode.
    pub terminate_contacts_body_names: Vec<String>,
    pub feet_body_names: Vec<String>,
}

impl Default for RobotCfg {
    fn default() -> Self {
        Self {
            actor_obs_history_length: 10,
            critic_obs_history_length: 10,
            action_scale: 0.25,
            terminate_contacts_body_names: Vec::new(),
            feet_body_names: Vec::new(),
        }
    }
}

/// Resolve body patterns. Patterns are only syntax-checked when the robot
/// declares no bodies.
fn resolve_bodies<S: AsRef<str>>(
    field: &str,
    patterns: &[String],
    bodies: &[S],
) -> Result<Vec<String>, ConfigError> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let selector = NameSelector::new(field, patterns)?;
    if bodies.is_empty() {
        warn!(field, "robot declares no bodies; patterns not checked");
        return Ok(Vec::new());
    }
    Ok(selector
        .resolve_names(bodies)?
        .into_iter()
        .map(str::to_string)
        .collect())
}

// ---------------------------------------------------------------------------
// Normalization, commands, noise
// ---------------------------------------------------------------------------

/// Per-group observation scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObsScalesCfg {
    pub lin_vel: f32,
    pub ang_vel: f32,
    pub projected_gravity: f32,
    pub commands: f32,
    pub joint_pos: f32,
    pub joint_vel: f32,
    pub actions: f32,
    pub height_scan: f32,
}

impl Default for ObsScalesCfg {
    fn default() -> Self {
        Self {
            lin_vel: 1.0,
            ang_vel: 1.0,
            projected_gravity: 1.0,
            commands: 1.0,
            joint_pos: 1.0,
            joint_vel: 1.0,
            actions: 1.0,
            height_scan: 1.0,
        }
    }
}

impl ObsScalesCfg {
    fn entries(&self) -> [(&'static str, f32); 8] {
        [
            ("lin_vel", self.lin_vel),
            ("ang_vel", self.ang_vel),
            ("projected_gravity", self.projected_gravity),
            ("commands", self.commands),
            ("joint_pos", self.joint_pos),
            ("joint_vel", self.joint_vel),
            ("actions", self.actions),
            ("height_scan", self.height_scan),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationCfg {
    pub obs_scales: ObsScalesCfg,
    pub clip_observations: f32,
    pub clip_actions: f32,
    /// Subtracted from raw height samples before scaling (m).
    pub height_scan_offset: f32,
}

impl Default for NormalizationCfg {
    fn default() -> Self {
        Self {
            obs_scales: ObsScalesCfg::default(),
            clip_observations: 100.0,
            clip_actions: 100.0,
            height_scan_offset: 0.5,
        }
    }
}

impl NormalizationCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, scale) in self.obs_scales.entries() {
            check::non_negative(&format!("normalization.obs_scales.{name}"), scale)?;
        }
        check::positive("normalization.clip_observations", self.clip_observations)?;
        check::positive("normalization.clip_actions", self.clip_actions)?;
        check::finite("normalization.height_scan_offset", self.height_scan_offset)
    }
}

/// Sampling ranges of the velocity command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandRangesCfg {
    pub lin_vel_x: (f32, f32),
    pub lin_vel_y: (f32, f32),
    pub ang_vel_z: (f32, f32),
    pub heading: (f32, f32),
}

impl Default for CommandRangesCfg {
    fn default() -> Self {
        Self {
            lin_vel_x: (-0.6, 1.0),
            lin_vel_y: (-0.5, 0.5),
            ang_vel_z: (-1.57, 1.57),
            heading: (-std::f32::consts::PI, std::f32::consts::PI),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsCfg {
    /// Seconds between command resamples.
    pub resampling_time_range: (f32, f32),
    /// Fraction of envs commanded to stand still.
    pub rel_standing_envs: f32,
    /// Fraction of envs driven by a heading target.
    pub rel_heading_envs: f32,
    pub heading_command: bool,
    pub heading_control_stiffness: f32,
    pub debug_vis: bool,
    pub ranges: CommandRangesCfg,
}

impl Default for CommandsCfg {
    fn default() -> Self {
        Self {
            resampling_time_range: (10.0, 10.0),
            rel_standing_envs: 0.2,
            rel_heading_envs: 1.0,
            heading_command: true,
            heading_control_stiffness: 0.5,
            debug_vis: true,
            ranges: CommandRangesCfg::default(),
        }
    }
}

impl CommandsCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        check::ordered_pair("commands.resampling_time_range", self.resampling_time_range)?;
        check::positive("commands.resampling_time_range", self.resampling_time_range.0)?;
        check::within("commands.rel_standing_envs", self.rel_standing_envs, 0.0, 1.0)?;
        check::within("commands.rel_heading_envs", self.rel_heading_envs, 0.0, 1.0)?;
        check::non_negative(
            "commands.heading_control_stiffness",
            self.heading_control_stiffness,
        )?;
        for (name, pair) in [
            ("lin_vel_x", self.ranges.lin_vel_x),
            ("lin_vel_y", self.ranges.lin_vel_y),
            ("ang_vel_z", self.ranges.ang_vel_z),
            ("heading", self.ranges.heading),
        ] {
            check::ordered_pair(&format!("commands.ranges.{name}"), pair)?;
        }
        Ok(())
    }
}

/// Standard deviation of observation noise per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseScalesCfg {
    pub ang_vel: f32,
    pub projected_gravity: f32,
    pub joint_pos: f32,
    pub joint_vel: f32,
    pub height_scan: f32,
}

impl Default for NoiseScalesCfg {
    fn default() -> Self {
        Self {
            ang_vel: 0.2,
            projected_gravity: 0.05,
            joint_pos: 0.01,
            joint_vel: 1.5,
            height_scan: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseCfg {
    pub add_noise: bool,
    pub noise_scales: NoiseScalesCfg,
}

impl Default for NoiseCfg {
    fn default() -> Self {
        Self {
            add_noise: true,
            noise_scales: NoiseScalesCfg::default(),
        }
    }
}

impl NoiseCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.noise_scales;
        for (name, v) in [
            ("ang_vel", s.ang_vel),
            ("projected_gravity", s.projected_gravity),
            ("joint_pos", s.joint_pos),
            ("joint_vel", s.joint_vel),
            ("height_scan", s.height_scan),
        ] {
            check::non_negative(&format!("noise.noise_scales.{name}"), v)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BaseEnvCfg
// ---------------------------------------------------------------------------

/// Complete environment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
#[serde(default)]
pub struct BaseEnvCfg {
    pub scene: BaseSceneCfg,
    pub robot: RobotCfg,
    pub reward: RewardCfg,
    pub normalization: NormalizationCfg,
    pub commands: CommandsCfg,
    pub noise: NoiseCfg,
    pub domain_rand: DomainRandCfg,
    pub sim: SimCfg,
}

/// An environment after every pattern has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEnv {
    pub name: String,
    pub robot: ResolvedArticulation,
    pub terminate_contact_bodies: Vec<String>,
    pub feet_bodies: Vec<String>,
    pub rewards: BTreeMap<String, ResolvedRewardTerm>,
    /// Zero when height scanning is off.
    pub height_scan_rays: usize,
    /// Policy timestep (s).
    pub control_dt: f64,
    pub max_episode_steps: u32,
}

impl ResolvedEnv {
    /// One action per joint.
    pub fn action_dim(&self) -> usize {
        self.robot.joint_count()
    }
}

impl BaseEnvCfg {
    /// Policy steps per episode, rounded up. Ratios within 1e-9 of an
    /// integer are not bumped by float error.
    pub fn max_episode_steps(&self) -> u32 {
        let ratio = f64::from(self.scene.max_episode_length_s) / self.sim.control_dt();
        let steps = (ratio - 1e-9).ceil().max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = steps as u32;
        steps
    }

    /// Validate every section and resolve all name patterns.
    ///
    /// Errors carry `name` and the dotted path of the offending field.
    pub fn resolve(&self, name: &str) -> Result<ResolvedEnv, ConfigError> {
        self.resolve_inner(name).map_err(|e| e.in_config(name))
    }

    fn resolve_inner(&self, name: &str) -> Result<ResolvedEnv, ConfigError> {
        self.sim.validate()?;
        let robot = self.scene.validate()?;
        let bodies = &self.scene.robot.body_names;

        check::positive("robot.actor_obs_history_length", self.robot.actor_obs_history_length)?;
        check::positive("robot.critic_obs_history_length", self.robot.critic_obs_history_length)?;
        check::positive("robot.action_scale", self.robot.action_scale)?;
        let terminate_contact_bodies = resolve_bodies(
            "robot.terminate_contacts_body_names",
            &self.robot.terminate_contacts_body_names,
            bodies,
        )?;
        let feet_bodies = resolve_bodies("robot.feet_body_names", &self.robot.feet_body_names, bodies)?;

        self.normalization.validate()?;
        self.commands.validate()?;
        self.noise.validate()?;
        self.domain_rand.validate(bodies)?;

        let joints: Vec<&str> = robot.joints.iter().map(|j| j.name.as_str()).collect();
        let rewards = self.reward.validate(bodies, &joints)?;

        let height_scan_rays = if self.scene.height_scanner.enable_height_scan {
            self.scene.height_scanner.num_rays()?
        } else {
            0
        };
        debug!(
            env = name,
            joints = robot.joint_count(),
            rewards = rewards.len(),
            height_scan_rays,
            "resolved environment"
        );

        Ok(ResolvedEnv {
            name: name.to_string(),
            robot,
            terminate_contact_bodies,
            feet_bodies,
            rewards,
            height_scan_rays,
            control_dt: self.sim.control_dt(),
            max_episode_steps: self.max_episode_steps(),
        })
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        self.resolve(name).map(|_| ())
    }

    /// Load from TOML and validate, naming the config after the file stem.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map_or_else(|| "env".to_string(), |s| s.to_string_lossy().into_owned());
        let config: Self = load_toml(path).map_err(|e| e.in_config(&name))?;
        config.validate(&name)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use stride_articulation::{ImplicitActuatorCfg, InitialStateCfg, UsdFileCfg};
    use stride_core::pattern::{PatternMap, PatternValue};

    use super::*;
    use crate::rewards::{RewardFn, RewardTermCfg, SceneEntityCfg};

    fn knee_env() -> BaseEnvCfg {
        let robot = ArticulationCfg {
            spawn: UsdFileCfg {
                usd_path: "robots/knees.usd".into(),
                ..UsdFileCfg::default()
            },
            init_state: InitialStateCfg {
                joint_pos: PatternMap::new()
                    .with("left_knee_joint", 0.7)
                    .with("right_knee_joint", 0.7),
                ..InitialStateCfg::default()
            },
            body_names: vec!["base_link".into(), "left_foot_link".into(), "right_foot_link".into()],
            ..ArticulationCfg::default()
        }
        .with_actuator(
            "legs",
            ImplicitActuatorCfg::new([".*_knee_joint"]).with_stiffness(PatternValue::uniform(40.0)),
        );

        let mut cfg = BaseEnvCfg {
            scene: BaseSceneCfg {
                robot,
                terrain_type: TerrainType::Plane,
                ..BaseSceneCfg::default()
            },
            reward: RewardCfg::new().with_term(
                "feet_stumble",
                RewardTermCfg::new(RewardFn::FeetStumble, -2.0)
                    .with_param("sensor_cfg", SceneEntityCfg::contact_sensor().with_bodies([".*foot.*"])),
            ),
            domain_rand: DomainRandCfg::default().with_mass_bodies([".*base.*"]),
            ..BaseEnvCfg::default()
        };
        cfg.robot.feet_body_names = vec![".*foot.*".into()];
        cfg
    }

    #[test]
    fn base_defaults() {
        let cfg = BaseEnvCfg::default();
        assert_eq!(cfg.scene.num_envs, 4096);
        assert_eq!(cfg.robot.actor_obs_history_length, 10);
        assert!((cfg.robot.action_scale - 0.25).abs() < f32::EPSILON);
        assert!((cfg.normalization.clip_actions - 100.0).abs() < f32::EPSILON);
        assert!(cfg.noise.add_noise);
        assert_eq!(cfg.max_episode_steps(), 1000);
    }

    #[test]
    fn knee_env_resolves() {
        let resolved = knee_env().resolve("knees").unwrap();
        assert_eq!(resolved.action_dim(), 2);
        assert_eq!(resolved.feet_bodies.len(), 2);
        assert_eq!(resolved.height_scan_rays, 0);
        assert_eq!(resolved.rewards["feet_stumble"].bodies.len(), 2);
    }

    #[test]
    fn height_scan_ray_count() {
        let scanner = HeightScannerCfg::default();
        assert_eq!(scanner.num_rays().unwrap(), 17 * 11);
    }

    #[test]
    fn dense_scanner_rejected() {
        let mut cfg = knee_env();
        cfg.scene.height_scanner.resolution = 1e-12;
        assert_eq!(
            cfg.resolve("knees").unwrap_err().field(),
            Some("scene.height_scanner.resolution")
        );
        cfg.scene.height_scanner.resolution = 1e-3;
        assert!(cfg.scene.height_scanner.num_rays().is_err());
        cfg.scene.height_scanner.resolution = 0.02;
        assert_eq!(cfg.scene.height_scanner.num_rays().unwrap(), 81 * 51);
    }

    #[test]
    fn generator_terrain_requires_generator() {
        let mut cfg = knee_env();
        cfg.scene.terrain_type = TerrainType::Generator;
        let err = cfg.resolve("knees").unwrap_err();
        assert_eq!(err.config_name(), Some("knees"));
        assert_eq!(err.field(), Some("scene.terrain_generator"));
    }

    #[test]
    fn init_level_must_fit_curriculum() {
        let mut cfg = knee_env();
        cfg.scene.terrain_type = TerrainType::Generator;
        cfg.scene.terrain_generator = Some(stride_terrain::rough());
        cfg.scene.max_init_terrain_level = 10;
        let err = cfg.resolve("knees").unwrap_err();
        assert_eq!(err.field(), Some("scene.max_init_terrain_level"));
        cfg.scene.max_init_terrain_level = 5;
        assert!(cfg.validate("knees").is_ok());
    }

    #[test]
    fn robot_errors_are_prefixed() {
        let mut cfg = knee_env();
        cfg.scene.robot = cfg.scene.robot.with_actuator(
            "feet",
            ImplicitActuatorCfg::new([".*_ankle_joint"]),
        );
        let err = cfg.resolve("knees").unwrap_err();
        assert_eq!(err.field(), Some("scene.robot.actuators.feet.joint_names_expr"));
    }

    #[test]
    fn feet_typo_fails() {
        let mut cfg = knee_env();
        cfg.robot.feet_body_names = vec![".*ankle_link".into()];
        let err = cfg.resolve("knees").unwrap_err();
        assert_eq!(err.field(), Some("robot.feet_body_names"));
    }

    #[test]
    fn enabled_scanner_needs_known_body() {
        let mut cfg = knee_env();
        cfg.scene.height_scanner.enable_height_scan = true;
        assert_eq!(
            cfg.resolve("knees").unwrap_err().field(),
            Some("scene.height_scanner.prim_body_name")
        );
        cfg.scene.height_scanner.prim_body_name = "torso_link".into();
        assert!(cfg.resolve("knees").is_err());
        cfg.scene.height_scanner.prim_body_name = "base_link".into();
        assert_eq!(cfg.resolve("knees").unwrap().height_scan_rays, 187);
    }

    #[test]
    fn out_of_range_fractions_rejected() {
        let mut cfg = knee_env();
        cfg.commands.rel_standing_envs = 1.5;
        assert_eq!(
            cfg.resolve("knees").unwrap_err().field(),
            Some("commands.rel_standing_envs")
        );
    }
}
