//! Environment, reward and agent configs for stride tasks.
//!
//! Every task is a pair of a [`BaseEnvCfg`] and a [`BaseAgentCfg`], kept in
//! a [`TaskRegistry`]. Variants are derived by copying a base config and
//! replacing fields, so a derived task differs from its base only where it
//! says so.
//!
//! With the `bevy` feature, [`TaskPlugin`] inserts a loaded task's configs as
//! resources.

pub mod agent;
pub mod atom;
pub mod env;
pub mod registry;
pub mod rewards;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use agent::{BaseAgentCfg, PolicyCfg, PpoAlgorithmCfg};
pub use env::{BaseEnvCfg, BaseSceneCfg, ResolvedEnv};
pub use registry::{Task, TaskRegistry};
pub use rewards::{RewardCfg, RewardFn, RewardTermCfg, SceneEntityCfg};

// ---------------------------------------------------------------------------
// TaskPlugin
// ---------------------------------------------------------------------------

/// Bevy plugin that inserts a task's env and agent configs as resources.
#[cfg(feature = "bevy")]
pub struct TaskPlugin {
    pub task: Task,
}

#[cfg(feature = "bevy")]
impl bevy::prelude::Plugin for TaskPlugin {
    fn build(&self, app: &mut bevy::prelude::App) {
        app.insert_resource(self.task.env.clone())
            .insert_resource(self.task.agent.clone());
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::agent::{
        Activation, BaseAgentCfg, LoggerKind, MlpPolicyCfg, PolicyCfg, PpoAlgorithmCfg,
        RnnPolicyCfg, RnnType, Schedule,
    };
    pub use crate::atom::{atom_flat_agent, atom_flat_env, atom_rough_agent, atom_rough_env};
    pub use crate::env::{
        BaseEnvCfg, BaseSceneCfg, CommandsCfg, HeightScannerCfg, NoiseCfg, NormalizationCfg,
        ResolvedEnv, RobotCfg, TerrainType,
    };
    pub use crate::registry::{Task, TaskRegistry};
    pub use crate::rewards::{
        ParamKind, RewardCfg, RewardFn, RewardKind, RewardParam, RewardTermCfg, SceneEntityCfg,
    };

    #[cfg(feature = "bevy")]
    pub use crate::TaskPlugin;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
