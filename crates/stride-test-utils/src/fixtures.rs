//! Config fixtures that validate without any asset on disk.

use stride_articulation::{ArticulationCfg, ImplicitActuatorCfg, InitialStateCfg, UsdFileCfg};
use stride_core::pattern::{PatternMap, PatternValue};
use stride_domain_rand::DomainRandCfg;
use stride_envs::env::{BaseEnvCfg, BaseSceneCfg, TerrainType};
use stride_envs::registry::Task;
use stride_envs::rewards::{RewardCfg, RewardFn, RewardTermCfg, SceneEntityCfg};
use stride_envs::BaseAgentCfg;

/// Bodies of [`two_knee_robot`].
pub const KNEE_BODIES: [&str; 3] = ["base_link", "left_foot_link", "right_foot_link"];

/// A robot with two knee joints in one `legs` group.
pub fn two_knee_robot() -> ArticulationCfg {
    ArticulationCfg {
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
        body_names: KNEE_BODIES.iter().map(|b| (*b).to_string()).collect(),
        ..ArticulationCfg::default()
    }
    .with_actuator(
        "legs",
        ImplicitActuatorCfg::new([".*_knee_joint"])
            .with_effort_limit(PatternValue::uniform(50.0))
            .with_velocity_limit(PatternValue::uniform(10.0))
            .with_stiffness(PatternValue::uniform(40.0))
            .with_damping(PatternValue::uniform(1.0)),
    )
}

/// [`two_knee_robot`] on a plane with a single reward term.
pub fn minimal_env() -> BaseEnvCfg {
    let mut cfg = BaseEnvCfg {
        scene: BaseSceneCfg {
            robot: two_knee_robot(),
            terrain_type: TerrainType::Plane,
            num_envs: 16,
            ..BaseSceneCfg::default()
        },
        reward: RewardCfg::new().with_term(
            "feet_stumble",
            RewardTermCfg::new(RewardFn::FeetStumble, -2.0).with_param(
                "sensor_cfg",
                SceneEntityCfg::contact_sensor().with_bodies([".*foot.*"]),
            ),
        ),
        domain_rand: DomainRandCfg::default().with_mass_bodies([".*base.*"]),
        ..BaseEnvCfg::default()
    };
    cfg.robot.terminate_contacts_body_names = vec!["base_link".into()];
    cfg.robot.feet_body_names = vec![".*foot.*".into()];
    cfg
}

/// [`minimal_env`] with a default agent under the name `knees`.
pub fn minimal_task() -> Task {
    Task {
        name: "knees".into(),
        env: minimal_env(),
        agent: BaseAgentCfg::named("knees"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
