//! Training-runner configuration.

use serde::{Deserialize, Serialize};
use stride_core::check;
use stride_core::error::ConfigError;
use stride_core::pattern;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Elu,
    Selu,
    Relu,
    Lrelu,
    Tanh,
    Sigmoid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RnnType {
    #[default]
    Lstm,
    Gru,
}

/// Feed-forward actor-critic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpPolicyCfg {
    pub init_noise_std: f32,
    pub actor_hidden_dims: Vec<u32>,
    pub critic_hidden_dims: Vec<u32>,
    pub activation: Activation,
}

impl Default for MlpPolicyCfg {
    fn default() -> Self {
        Self {
            init_noise_std: 1.0,
            actor_hidden_dims: vec![512, 256, 128],
            critic_hidden_dims: vec![512, 256, 128],
            activation: Activation::Elu,
        }
    }
}

impl MlpPolicyCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        check::positive("policy.init_noise_std", self.init_noise_std)?;
        for (name, dims) in [
            ("actor_hidden_dims", &self.actor_hidden_dims),
            ("critic_hidden_dims", &self.critic_hidden_dims),
        ] {
            let field = format!("policy.{name}");
            if dims.is_empty() {
                return Err(ConfigError::MissingField(field));
            }
            if dims.contains(&0) {
                return Err(ConfigError::invalid(field, "layer width must be >= 1"));
            }
        }
        Ok(())
    }
}

/// Actor-critic with a recurrent encoder in front of the MLP heads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RnnPolicyCfg {
    #[serde(flatten)]
    pub mlp: MlpPolicyCfg,
    pub rnn_type: RnnType,
    pub rnn_hidden_size: u32,
    pub rnn_num_layers: u32,
}

impl Default for RnnPolicyCfg {
    fn default() -> Self {
        Self {
            mlp: MlpPolicyCfg::default(),
            rnn_type: RnnType::Lstm,
            rnn_hidden_size: 256,
            rnn_num_layers: 1,
        }
    }
}

/// Policy architecture, tagged by runner class name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum PolicyCfg {
    #[serde(rename = "ActorCritic")]
    Mlp(MlpPolicyCfg),
    #[serde(rename = "ActorCriticRecurrent")]
    Rnn(RnnPolicyCfg),
}

impl Default for PolicyCfg {
    fn default() -> Self {
        Self::Mlp(MlpPolicyCfg::default())
    }
}

impl PolicyCfg {
    pub fn rnn() -> Self {
        Self::Rnn(RnnPolicyCfg::default())
    }

    pub const fn is_recurrent(&self) -> bool {
        matches!(self, Self::Rnn(_))
    }

    /// The feed-forward part shared by both variants.
    pub const fn mlp(&self) -> &MlpPolicyCfg {
        match self {
            Self::Mlp(m) => m,
            Self::Rnn(r) => &r.mlp,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.mlp().validate()?;
        if let Self::Rnn(rnn) = self {
            check::positive("policy.rnn_hidden_size", rnn.rnn_hidden_size)?;
            check::positive("policy.rnn_num_layers", rnn.rnn_num_layers)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PPO
// ---------------------------------------------------------------------------

/// Learning-rate schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Adjusted to keep the KL divergence near `desired_kl`.
    #[default]
    Adaptive,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PpoAlgorithmCfg {
    pub value_loss_coef: f32,
    pub use_clipped_value_loss: bool,
    pub clip_param: f32,
    pub entropy_coef: f32,
    pub num_learning_epochs: u32,
    pub num_mini_batches: u32,
    pub learning_rate: f32,
    pub schedule: Schedule,
    pub gamma: f32,
    pub lam: f32,
    pub desired_kl: f32,
    pub max_grad_norm: f32,
}

impl Default for PpoAlgorithmCfg {
    fn default() -> Self {
        Self {
            value_loss_coef: 1.0,
            use_clipped_value_loss: true,
            clip_param: 0.2,
            entropy_coef: 0.005,
            num_learning_epochs: 5,
            num_mini_batches: 4,
            learning_rate: 1.0e-3,
            schedule: Schedule::Adaptive,
            gamma: 0.99,
            lam: 0.95,
            desired_kl: 0.01,
            max_grad_norm: 1.0,
        }
    }
}

impl PpoAlgorithmCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        check::non_negative("algorithm.value_loss_coef", self.value_loss_coef)?;
        check::positive("algorithm.clip_param", self.clip_param)?;
        check::non_negative("algorithm.entropy_coef", self.entropy_coef)?;
        check::positive("algorithm.num_learning_epochs", self.num_learning_epochs)?;
        check::positive("algorithm.num_mini_batches", self.num_mini_batches)?;
        check::positive("algorithm.learning_rate", self.learning_rate)?;
        check::within("algorithm.gamma", self.gamma, 0.0, 1.0)?;
        check::within("algorithm.lam", self.lam, 0.0, 1.0)?;
        if self.schedule == Schedule::Adaptive {
            check::positive("algorithm.desired_kl", self.desired_kl)?;
        }
        check::positive("algorithm.max_grad_norm", self.max_grad_norm)
    }
}

// ---------------------------------------------------------------------------
// BaseAgentCfg
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggerKind {
    Tensorboard,
    #[default]
    Wandb,
    Neptune,
}

/// Runner metadata, policy and algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
#[serde(default)]
pub struct BaseAgentCfg {
    pub resume: bool,
    pub num_steps_per_env: u32,
    pub max_iterations: u32,
    pub save_interval: u32,
    pub experiment_name: String,
    pub empirical_normalization: bool,
    pub device: String,
    pub run_name: String,
    pub logger: LoggerKind,
    pub wandb_project: String,
    /// Run directory pattern to resume from.
    pub load_run: String,
    /// Checkpoint file pattern to resume from.
    pub load_checkpoint: String,
    pub seed: u64,
    pub policy: PolicyCfg,
    pub algorithm: PpoAlgorithmCfg,
}

impl Default for BaseAgentCfg {
    fn default() -> Self {
        Self {
            resume: false,
            num_steps_per_env: 24,
            max_iterations: 50_000,
            save_interval: 100,
            experiment_name: "test".into(),
            empirical_normalization: false,
            device: "cuda:0".into(),
            run_name: String::new(),
            logger: LoggerKind::Wandb,
            wandb_project: "test".into(),
            load_run: ".*".into(),
            load_checkpoint: "model_.*.pt".into(),
            seed: 42,
            policy: PolicyCfg::default(),
            algorithm: PpoAlgorithmCfg::default(),
        }
    }
}

impl BaseAgentCfg {
    /// Default runner settings under a new experiment name, which is also
    /// the wandb project.
    pub fn named(experiment: &str) -> Self {
        Self {
            experiment_name: experiment.into(),
            wandb_project: experiment.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PolicyCfg) -> Self {
        self.policy = policy;
        self
    }

    /// Transitions collected per iteration across `num_envs` environments.
    pub fn batch_size(&self, num_envs: u32) -> u64 {
        u64::from(num_envs) * u64::from(self.num_steps_per_env)
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        self.validate_inner().map_err(|e| e.in_config(name))
    }

    fn validate_inner(&self) -> Result<(), ConfigError> {
        check::positive("num_steps_per_env", self.num_steps_per_env)?;
        check::positive("max_iterations", self.max_iterations)?;
        check::positive("save_interval", self.save_interval)?;
        check::non_empty("experiment_name", &self.experiment_name)?;
        check::non_empty("device", &self.device)?;
        if self.logger == LoggerKind::Wandb {
            check::non_empty("wandb_project", &self.wandb_project)?;
        }
        pattern::compile("load_run", &self.load_run)?;
        pattern::compile("load_checkpoint", &self.load_checkpoint)?;
        self.policy.validate()?;
        self.algorithm.validate()
    }

    /// Whether a training batch for `num_envs` splits evenly into the
    /// configured mini-batches.
    pub fn check_batching(&self, num_envs: u32) -> Result<(), ConfigError> {
        let batch = self.batch_size(num_envs);
        let minibatches = u64::from(self.algorithm.num_mini_batches);
        if minibatches == 0 || batch % minibatches != 0 {
            return Err(ConfigError::Incompatible(format!(
                "batch of {batch} transitions does not split into {minibatches} mini-batches"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
