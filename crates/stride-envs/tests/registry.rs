//! Registry behaviour with user-registered tasks.

use stride_core::error::{ConfigError, StrideError};
use stride_core::overrides::Override;
use stride_envs::TaskRegistry;
use stride_test_utils::{minimal_task, two_knee_robot};

fn registry_with_knees() -> TaskRegistry {
    let mut registry = TaskRegistry::builtin().unwrap();
    let task = minimal_task();
    registry.register(&task.name, task.env, task.agent).unwrap();
    registry
}

#[test]
fn custom_task_is_listed_and_loads() {
    let registry = registry_with_knees();
    assert_eq!(registry.len(), 3);
    assert!(registry.contains("knees"));
    let task = registry.load("knees", &[]).unwrap();
    assert_eq!(task.resolve().unwrap().action_dim(), 2);
}

#[test]
fn override_reaches_robot_gains() {
    let registry = registry_with_knees();
    let ov: Override = "env.scene.robot.actuators.legs.stiffness=55.0".parse().unwrap();
    let task = registry.load("knees", &[ov]).unwrap();
    let resolved = task.resolve().unwrap();
    let knee = resolved.robot.joint("left_knee_joint").unwrap();
    assert_eq!(knee.stiffness, Some(55.0));
}

#[test]
fn override_to_missing_field_fails() {
    let registry = registry_with_knees();
    let ov: Override = "env.scene.num_robots=2".parse().unwrap();
    assert!(matches!(
        registry.load("knees", &[ov]),
        Err(StrideError::Override(_))
    ));
}

#[test]
fn invalid_custom_task_reports_its_name() {
    let mut registry = TaskRegistry::new();
    let mut task = minimal_task();
    task.env.scene.robot = two_knee_robot().with_actuator(
        "arms",
        stride_articulation::ImplicitActuatorCfg::new([".*_elbow_joint"]),
    );
    let err = registry.register("broken", task.env, task.agent).unwrap_err();
    let StrideError::Config(err) = err else {
        panic!("expected a config error, got {err:?}");
    };
    assert_eq!(err.config_name(), Some("broken"));
    assert!(matches!(
        err,
        ConfigError::InConfig { ref source, .. } if matches!(**source, ConfigError::UnresolvedPattern { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn quoted_override_reaches_one_pattern() {
    let registry = TaskRegistry::builtin().unwrap();
    let ov: Override = r#"env.scene.robot.actuators.legs.damping.".*_knee_joint"=2.0"#
        .parse()
        .unwrap();
    let resolved = registry.load("atom_flat", &[ov]).unwrap().resolve().unwrap();
    assert_eq!(resolved.robot.joint("left_knee_joint").unwrap().damping, Some(2.0));
    assert_eq!(resolved.robot.joint("right_hip_roll_joint").unwrap().damping, Some(1.5));
}
