//! Named task registry.
//!
//! A task pairs an environment config with an agent config. Lookups hand out
//! references to the registered configs; [`TaskRegistry::load`] returns an
//! independent copy with overrides applied and everything validated.

use std::collections::BTreeMap;

use stride_core::error::{ConfigError, OverrideError, StrideError};
use stride_core::overrides::{Override, apply_overrides};
use tracing::{debug, info};

use crate::agent::BaseAgentCfg;
use crate::atom::{atom_flat_agent, atom_flat_env, atom_rough_agent, atom_rough_env};
use crate::env::{BaseEnvCfg, ResolvedEnv};

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// An environment and the agent that trains on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub name: String,
    pub env: BaseEnvCfg,
    pub agent: BaseAgentCfg,
}

impl Task {
    /// Validate both configs and their pairing, returning the resolved
    /// environment.
    pub fn resolve(&self) -> Result<ResolvedEnv, ConfigError> {
        let env = self.env.resolve(&self.name)?;
        self.agent.validate(&self.name)?;
        self.agent
            .check_batching(self.env.scene.num_envs)
            .map_err(|e| e.in_config(&self.name))?;
        Ok(env)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve().map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// TaskRegistry
// ---------------------------------------------------------------------------

/// Tasks keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `atom_flat` and `atom_rough`.
    pub fn builtin() -> Result<Self, StrideError> {
        let mut registry = Self::new();
        registry.register("atom_flat", atom_flat_env(), atom_flat_agent())?;
        registry.register("atom_rough", atom_rough_env()?, atom_rough_agent())?;
        Ok(registry)
    }

    /// Add a task. Names are unique and the task must validate; a rejected
    /// task leaves the registry unchanged.
    pub fn register(
        &mut self,
        name: &str,
        env: BaseEnvCfg,
        agent: BaseAgentCfg,
    ) -> Result<(), StrideError> {
        if self.tasks.contains_key(name) {
            return Err(StrideError::DuplicateTask(name.to_string()));
        }
        let task = Task {
            name: name.to_string(),
            env,
            agent,
        };
        task.validate()?;
        debug!(task = name, "registered task");
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn task(&self, name: &str) -> Result<&Task, StrideError> {
        self.tasks
            .get(name)
            .ok_or_else(|| StrideError::UnknownTask(name.to_string()))
    }

    pub fn env(&self, name: &str) -> Result<&BaseEnvCfg, StrideError> {
        self.task(name).map(|t| &t.env)
    }

    pub fn agent(&self, name: &str) -> Result<&BaseAgentCfg, StrideError> {
        self.task(name).map(|t| &t.agent)
    }

    /// Copy a task, apply `overrides` and validate the result.
    ///
    /// Override paths start with `env.` or `agent.`. The registered task is
    /// never modified.
    pub fn load(&self, name: &str, overrides: &[Override]) -> Result<Task, StrideError> {
        let task = self.task(name)?;
        let (env_overrides, agent_overrides) = split_overrides(overrides)?;
        let loaded = Task {
            name: task.name.clone(),
            env: apply_overrides(&task.env, &env_overrides)?,
            agent: apply_overrides(&task.agent, &agent_overrides)?,
        };
        loaded.validate()?;
        info!(task = name, overrides = overrides.len(), "loaded task");
        Ok(loaded)
    }

    /// Validate every task, reporting each outcome.
    pub fn validate_all(&self) -> Vec<(&str, Result<(), ConfigError>)> {
        self.tasks
            .iter()
            .map(|(name, task)| (name.as_str(), task.validate()))
            .collect()
    }
}

/// Route overrides by their leading `env` or `agent` segment, stripping it.
fn split_overrides(overrides: &[Override]) -> Result<(Vec<Override>, Vec<Override>), OverrideError> {
    let mut env = Vec::new();
    let mut agent = Vec::new();
    for ov in overrides {
        let target = match ov.path.first().map(String::as_str) {
            Some("env") => &mut env,
            Some("agent") => &mut agent,
            _ => return Err(OverrideError::UnknownPath(ov.dotted_path())),
        };
        if ov.path.len() < 2 {
            return Err(OverrideError::Malformed(ov.dotted_path()));
        }
        target.push(Override {
            path: ov.path[1..].to_vec(),
            value: ov.value.clone(),
        });
    }
    Ok((env, agent))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(items: &[&str]) -> Vec<Override> {
        items.iter().map(|s| Override::parse(s).unwrap()).collect()
    }

    #[test]
    fn builtin_tasks() {
        let registry = TaskRegistry::builtin().unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["atom_flat", "atom_rough"]);
        for (name, result) in registry.validate_all() {
            assert!(result.is_ok(), "{name}: {result:?}");
        }
    }

    #[test]
    fn unknown_task() {
        let registry = TaskRegistry::builtin().unwrap();
        assert!(matches!(
            registry.env("atom_stairs"),
            Err(StrideError::UnknownTask(_))
        ));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = TaskRegistry::builtin().unwrap();
        let err = registry
            .register("atom_flat", atom_flat_env(), atom_flat_agent())
            .unwrap_err();
        assert!(matches!(err, StrideError::DuplicateTask(name) if name == "atom_flat"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn invalid_task_is_not_registered() {
        let mut registry = TaskRegistry::builtin().unwrap();
        let mut env = atom_flat_env();
        env.sim.dt = -1.0;
        let err = registry
            .register("atom_broken", env, atom_flat_agent())
            .unwrap_err();
        let StrideError::Config(err) = err else {
            panic!("expected a config error, got {err:?}");
        };
        assert_eq!(err.config_name(), Some("atom_broken"));
        assert!(!registry.contains("atom_broken"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn load_applies_overrides_to_a_copy() {
        let registry = TaskRegistry::builtin().unwrap();
        let task = registry
            .load(
                "atom_flat",
                &overrides(&["env.scene.num_envs=1024", "agent.seed=7"]),
            )
            .unwrap();
        assert_eq!(task.env.scene.num_envs, 1024);
        assert_eq!(task.agent.seed, 7);
        assert_eq!(registry.env("atom_flat").unwrap().scene.num_envs, 4096);
        assert_eq!(registry.agent("atom_flat").unwrap().seed, 42);
    }

    #[test]
    fn load_rejects_unrouted_override() {
        let registry = TaskRegistry::builtin().unwrap();
        let err = registry
            .load("atom_flat", &overrides(&["scene.num_envs=1024"]))
            .unwrap_err();
        assert!(matches!(err, StrideError::Override(OverrideError::UnknownPath(_))));
    }

    #[test]
    fn load_validates_result() {
        let registry = TaskRegistry::builtin().unwrap();
        let err = registry
            .load(
                "atom_rough",
                &overrides(&[r#"env.robot.feet_body_names=[".*toe.*"]"#]),
            )
            .unwrap_err();
        let StrideError::Config(err) = err else {
            panic!("expected a config error, got {err:?}");
        };
        assert_eq!(err.config_name(), Some("atom_rough"));
    }

    #[test]
    fn load_checks_batching() {
        let registry = TaskRegistry::builtin().unwrap();
        let err = registry
            .load("atom_flat", &overrides(&["env.scene.num_envs=3", "agent.num_steps_per_env=1"]))
            .unwrap_err();
        assert!(err.to_string().contains("mini-batches"));
    }
}
