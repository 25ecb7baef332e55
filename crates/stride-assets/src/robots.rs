//! Biped presets.
//!
//! * [`atom`]: ATOM humanoid, 18 joints (legs, ankles, shoulders, elbows).
//! * [`duck`]: DUCK biped, 10 leg joints, no arms.

use stride_articulation::{
    ArticulationCfg, ArticulationRootPropertiesCfg, ImplicitActuatorCfg, InitialStateCfg,
    RigidBodyPropertiesCfg, UsdFileCfg,
};
use stride_core::pattern::{PatternMap, PatternValue};

use crate::asset_dir;

const SIDES: [&str; 2] = ["left", "right"];

const LEG_PATTERNS: [&str; 4] = [
    ".*_hip_roll_joint",
    ".*_hip_yaw_joint",
    ".*_hip_pitch_joint",
    ".*_knee_joint",
];

/// Spawn settings shared by both bipeds.
///
/// DUCK points at the ATOM model as well; there is no separate duck asset.
fn biped_spawn() -> UsdFileCfg {
    UsdFileCfg {
        usd_path: asset_dir().join("ours/atom/atom.usd"),
        activate_contact_sensors: true,
        rigid_props: RigidBodyPropertiesCfg {
            disable_gravity: false,
            retain_accelerations: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
            max_linear_velocity: 1000.0,
            max_angular_velocity: 1000.0,
            max_depenetration_velocity: 1.0,
        },
        articulation_props: ArticulationRootPropertiesCfg {
            enabled_self_collisions: true,
            solver_position_iteration_count: 4,
            solver_velocity_iteration_count: 1,
        },
    }
}

/// `{side}_{link}` for both sides, left first.
fn sided(links: &[&str]) -> Vec<String> {
    SIDES
        .iter()
        .flat_map(|side| links.iter().map(move |link| format!("{side}_{link}")))
        .collect()
}

fn with_base(mut links: Vec<String>) -> Vec<String> {
    links.insert(0, "base_link".to_string());
    links
}

fn same_for<const N: usize>(patterns: [&str; N], value: f32) -> PatternValue<f32> {
    PatternValue::per_pattern(patterns.map(|p| (p, value)))
}

// ---------------------------------------------------------------------------
// ATOM
// ---------------------------------------------------------------------------

/// ATOM humanoid.
pub fn atom() -> ArticulationCfg {
    let mut joint_pos = PatternMap::new();
    for side in SIDES {
        for (joint, pos) in [
            ("hip_roll_joint", 0.0),
            ("hip_yaw_joint", 0.0),
            ("hip_pitch_joint", -0.25),
            ("knee_joint", 0.7),
            ("ankle_joint", -0.45),
            ("shoulder_pitch_joint", 0.0),
            ("shoulder_roll_joint", 0.0),
            ("shoulder_yaw_joint", 0.0),
            ("elbow_joint", 0.0),
        ] {
            joint_pos.insert(format!("{side}_{joint}"), pos);
        }
    }

    ArticulationCfg {
        spawn: biped_spawn(),
        init_state: InitialStateCfg {
            pos: [0.0, 0.0, 0.52],
            joint_pos,
            ..InitialStateCfg::default()
        },
        soft_joint_pos_limit_factor: 0.90,
        body_names: with_base(sided(&[
            "hip_roll_link",
            "hip_yaw_link",
            "hip_pitch_link",
            "knee_link",
            "foot_link",
            "shoulder_pitch_link",
            "shoulder_roll_link",
            "shoulder_yaw_link",
            "elbow_link",
        ])),
        ..ArticulationCfg::default()
    }
    .with_actuator(
        "legs",
        ImplicitActuatorCfg::new(LEG_PATTERNS)
            .with_effort_limit(same_for(LEG_PATTERNS, 20.0))
            .with_velocity_limit(same_for(LEG_PATTERNS, 25.0))
            .with_stiffness(same_for(LEG_PATTERNS, 40.0))
            .with_damping(PatternValue::per_pattern([
                (".*_hip_roll_joint", 1.5),
                (".*_hip_yaw_joint", 1.0),
                (".*_hip_pitch_joint", 1.25),
                (".*_knee_joint", 1.25),
            ]))
            .with_armature(PatternValue::uniform(0.01)),
    )
    .with_actuator(
        "feet",
        ImplicitActuatorCfg::new([".*_ankle_joint"])
            .with_effort_limit(same_for([".*_ankle_joint"], 12.0))
            .with_velocity_limit(same_for([".*_ankle_joint"], 25.0))
            .with_stiffness(PatternValue::uniform(35.0))
            .with_damping(PatternValue::uniform(0.25))
            .with_armature(PatternValue::uniform(0.01)),
    )
    .with_actuator(
        "shoulders",
        ImplicitActuatorCfg::new([".*_shoulder_pitch_joint", ".*_shoulder_roll_joint"])
            .with_effort_limit(same_for([".*_shoulder_pitch_joint", ".*_shoulder_roll_joint"], 5.0))
            .with_velocity_limit(same_for([".*_shoulder_pitch_joint", ".*_shoulder_roll_joint"], 10.0))
            .with_stiffness(PatternValue::uniform(8.0))
            .with_damping(PatternValue::uniform(0.2))
            .with_armature(PatternValue::uniform(0.01)),
    )
    .with_actuator(
        "arms",
        ImplicitActuatorCfg::new([".*_shoulder_yaw_joint", ".*_elbow_joint"])
            .with_effort_limit(same_for([".*_shoulder_yaw_joint", ".*_elbow_joint"], 5.0))
            .with_velocity_limit(same_for([".*_shoulder_yaw_joint", ".*_elbow_joint"], 10.0))
            .with_stiffness(PatternValue::uniform(8.0))
            .with_damping(PatternValue::uniform(0.2))
            .with_armature(PatternValue::uniform(0.1)),
    )
}

// ---------------------------------------------------------------------------
// DUCK
// ---------------------------------------------------------------------------

/// DUCK biped. Legs only.
pub fn duck() -> ArticulationCfg {
    let mut joint_pos = PatternMap::new();
    for (side, roll) in [("left", -0.05), ("right", 0.05)] {
        for (joint, pos) in [
            ("hip_yaw_joint", 0.0),
            ("hip_roll_joint", roll),
            ("hip_pitch_joint", -0.4),
            ("knee_joint", 0.9),
            ("ankle_joint", -0.5),
        ] {
            joint_pos.insert(format!("{side}_{joint}"), pos);
        }
    }

    ArticulationCfg {
        spawn: biped_spawn(),
        init_state: InitialStateCfg {
            pos: [0.0, 0.0, 0.42],
            joint_pos,
            ..InitialStateCfg::default()
        },
        soft_joint_pos_limit_factor: 0.90,
        body_names: with_base(sided(&[
            "hip_yaw_link",
            "hip_roll_link",
            "hip_pitch_link",
            "knee_link",
            "foot_link",
        ])),
        ..ArticulationCfg::default()
    }
    .with_actuator(
        "legs",
        ImplicitActuatorCfg::new(LEG_PATTERNS)
            .with_effort_limit(same_for(LEG_PATTERNS, 20.0))
            .with_velocity_limit(same_for(LEG_PATTERNS, 25.0))
            .with_stiffness(same_for(LEG_PATTERNS, 40.0))
            .with_damping(same_for(LEG_PATTERNS, 2.0))
            .with_armature(PatternValue::uniform(0.01)),
    )
    .with_actuator(
        "feet",
        ImplicitActuatorCfg::new([".*_ankle_joint"])
            .with_effort_limit(same_for([".*_ankle_joint"], 18.0))
            .with_velocity_limit(same_for([".*_ankle_joint"], 25.0))
            .with_stiffness(PatternValue::uniform(25.0))
            .with_damping(PatternValue::uniform(0.5))
            .with_armature(PatternValue::uniform(0.01)),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_resolves_every_joint() {
        let resolved = atom().resolve().unwrap();
        assert_eq!(resolved.joint_count(), 18);
        assert!(resolved.is_fully_actuated());
        assert_eq!(resolved.group_joints("legs").len(), 8);
        assert_eq!(resolved.group_joints("feet").len(), 2);
        assert_eq!(resolved.group_joints("shoulders").len(), 4);
        assert_eq!(resolved.group_joints("arms").len(), 4);
    }

    #[test]
    fn atom_leg_gains() {
        let resolved = atom().resolve().unwrap();
        let roll = resolved.joint("left_hip_roll_joint").unwrap();
        assert_eq!(roll.stiffness, Some(40.0));
        assert_eq!(roll.damping, Some(1.5));
        assert_eq!(roll.effort_limit, Some(20.0));
        let yaw = resolved.joint("right_hip_yaw_joint").unwrap();
        assert_eq!(yaw.damping, Some(1.0));
        let knee = resolved.joint("left_knee_joint").unwrap();
        assert_eq!(knee.damping, Some(1.25));
        assert!((knee.init_pos - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn atom_feet_and_arms() {
        let resolved = atom().resolve().unwrap();
        let ankle = resolved.joint("right_ankle_joint").unwrap();
        assert_eq!(ankle.group.as_deref(), Some("feet"));
        assert_eq!(ankle.effort_limit, Some(12.0));
        assert_eq!(ankle.stiffness, Some(35.0));
        assert!((ankle.init_pos + 0.45).abs() < f32::EPSILON);

        let elbow = resolved.joint("left_elbow_joint").unwrap();
        assert_eq!(elbow.group.as_deref(), Some("arms"));
        assert_eq!(elbow.armature, Some(0.1));
        let shoulder = resolved.joint("left_shoulder_roll_joint").unwrap();
        assert_eq!(shoulder.group.as_deref(), Some("shoulders"));
        assert_eq!(shoulder.armature, Some(0.01));
    }

    #[test]
    fn duck_resolves_legs_only() {
        let resolved = duck().resolve().unwrap();
        assert_eq!(resolved.joint_count(), 10);
        assert!(resolved.is_fully_actuated());
        assert!(resolved.group_joints("arms").is_empty());
        let roll = resolved.joint("right_hip_roll_joint").unwrap();
        assert!((roll.init_pos - 0.05).abs() < f32::EPSILON);
        assert_eq!(roll.damping, Some(2.0));
        assert_eq!(resolved.joint("left_ankle_joint").unwrap().effort_limit, Some(18.0));
    }

    #[test]
    fn root_heights() {
        assert!((atom().init_state.pos[2] - 0.52).abs() < f32::EPSILON);
        assert!((duck().init_state.pos[2] - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn duck_shares_the_atom_model() {
        assert_eq!(atom().spawn, duck().spawn);
        assert!(duck().spawn.usd_path.ends_with("ours/atom/atom.usd"));
    }

    #[test]
    fn bodies_include_base_and_feet() {
        for robot in [atom(), duck()] {
            assert_eq!(robot.body_names[0], "base_link");
            assert!(robot.body_names.contains(&"left_foot_link".to_string()));
            assert!(robot.body_names.contains(&"right_foot_link".to_string()));
        }
    }

    #[test]
    fn presets_survive_toml() {
        for robot in [atom(), duck()] {
            let text = toml::to_string(&robot).unwrap();
            let back: ArticulationCfg = toml::from_str(&text).unwrap();
            assert_eq!(robot, back);
        }
    }
}
