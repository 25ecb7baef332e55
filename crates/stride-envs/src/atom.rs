//! ATOM locomotion tasks.
//!
//! `atom_rough` is `atom_flat` with a handful of fields replaced; it is built
//! by cloning the flat config, never from scratch, so every other field
//! stays identical.

use stride_assets::atom;
use stride_core::error::ConfigError;
use stride_terrain::{gravel, rough};

use crate::agent::{BaseAgentCfg, PolicyCfg};
use crate::env::{BaseEnvCfg, BaseSceneCfg, TerrainType};
use crate::rewards::{RewardCfg, RewardFn, RewardTermCfg, SceneEntityCfg};

fn feet_sensor() -> SceneEntityCfg {
    SceneEntityCfg::contact_sensor().with_bodies([".*foot.*"])
}

fn joint_deviation(weight: f32, joints: &[&str]) -> RewardTermCfg {
    RewardTermCfg::new(RewardFn::JointDeviationL1, weight)
        .with_param("asset_cfg", SceneEntityCfg::robot().with_joints(joints.iter().copied()))
}

/// Reward terms shared by both ATOM tasks.
pub fn atom_rewards() -> RewardCfg {
    use RewardFn::*;

    RewardCfg::new()
        .with_term(
            "track_lin_vel_xy_exp",
            RewardTermCfg::new(TrackLinVelXyYawFrameExp, 1.0).with_param("std", 0.5),
        )
        .with_term(
            "track_ang_vel_z_exp",
            RewardTermCfg::new(TrackAngVelZWorldExp, 1.0).with_param("std", 0.5),
        )
        .with_term("lin_vel_z_l2", RewardTermCfg::new(LinVelZL2, -1.0))
        .with_term("ang_vel_xy_l2", RewardTermCfg::new(AngVelXyL2, -0.05))
        .with_term("energy", RewardTermCfg::new(Energy, -1e-3))
        .with_term("dof_acc_l2", RewardTermCfg::new(JointAccL2, -1.25e-7))
        .with_term("action_rate_l2", RewardTermCfg::new(ActionRateL2, -0.01))
        .with_term(
            "undesired_contacts",
            RewardTermCfg::new(UndesiredContacts, -1.0)
                .with_param(
                    "sensor_cfg",
                    SceneEntityCfg::contact_sensor().with_bodies(["!.*foot.*"]),
                )
                .with_param("threshold", 1.0),
        )
        .with_term(
            "fly",
            RewardTermCfg::new(Fly, -1.0)
                .with_param("sensor_cfg", feet_sensor())
                .with_param("threshold", 1.0),
        )
        .with_term("flat_orientation_l2", RewardTermCfg::new(FlatOrientationL2, -1.0))
        .with_term("termination_penalty", RewardTermCfg::new(IsTerminated, -200.0))
        .with_term(
            "feet_air_time",
            RewardTermCfg::new(FeetAirTimePositiveBiped, 0.5)
                .with_param("sensor_cfg", feet_sensor())
                .with_param("threshold", 0.4),
        )
        .with_term(
            "feet_slide",
            RewardTermCfg::new(FeetSlide, -0.25)
                .with_param("sensor_cfg", feet_sensor())
                .with_param("asset_cfg", SceneEntityCfg::robot().with_bodies([".*foot.*"])),
        )
        .with_term(
            "feet_force",
            RewardTermCfg::new(BodyForce, -3e-3)
                .with_param("sensor_cfg", feet_sensor())
                .with_param("threshold", 500.0)
                .with_param("max_reward", 400.0),
        )
        .with_term(
            "feet_too_near",
            RewardTermCfg::new(FeetTooNearHumanoid, -2.0)
                .with_param("asset_cfg", SceneEntityCfg::robot().with_bodies([".*foot.*"]))
                .with_param("threshold", 0.3),
        )
        .with_term(
            "feet_stumble",
            RewardTermCfg::new(FeetStumble, -2.0).with_param("sensor_cfg", feet_sensor()),
        )
        .with_term("dof_pos_limits", RewardTermCfg::new(JointPosLimits, -2.0))
        .with_term(
            "joint_deviation_hip",
            joint_deviation(-0.1, &[".*_hip_yaw.*", ".*_hip_roll.*"]),
        )
        .with_term(
            "joint_deviation_arms",
            joint_deviation(-0.2, &[".*_shoulder.*", ".*_elbow.*"]),
        )
        .with_term(
            "joint_deviation_legs",
            joint_deviation(-0.05, &[".*_hip_pitch.*", ".*_knee.*", ".*ankle.*"]),
        )
}

/// ATOM on uniform gravel, blind.
pub fn atom_flat_env() -> BaseEnvCfg {
    let mut cfg = BaseEnvCfg {
        scene: BaseSceneCfg {
            robot: atom(),
            terrain_type: TerrainType::Generator,
            terrain_generator: Some(gravel()),
            ..BaseSceneCfg::default()
        },
        reward: atom_rewards(),
        ..BaseEnvCfg::default()
    };
    cfg.scene.height_scanner.prim_body_name = "base_link".into();
    cfg.robot.terminate_contacts_body_names = vec![".*base.*".into()];
    cfg.robot.feet_body_names = vec![".*foot.*".into()];
    cfg.domain_rand.add_rigid_body_mass.body_names = vec![".*base.*".into()];
    cfg
}

/// [`atom_flat_env`] on rough terrain with a height scan and no
/// observation history.
pub fn atom_rough_env() -> Result<BaseEnvCfg, ConfigError> {
    let mut cfg = atom_flat_env();
    cfg.scene.height_scanner.enable_height_scan = true;
    cfg.scene.terrain_generator = Some(rough());
    cfg.robot.actor_obs_history_length = 1;
    cfg.robot.critic_obs_history_length = 1;
    cfg.reward.set_weight("track_lin_vel_xy_exp", 1.5)?;
    cfg.reward.set_weight("track_ang_vel_z_exp", 1.5)?;
    cfg.reward.set_weight("lin_vel_z_l2", -0.25)?;
    Ok(cfg)
}

pub fn atom_flat_agent() -> BaseAgentCfg {
    BaseAgentCfg::named("atom_flat")
}

pub fn atom_rough_agent() -> BaseAgentCfg {
    BaseAgentCfg::named("atom_rough").with_policy(PolicyCfg::rnn())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
