//! Stride config inspection CLI.
//!
//! Provides these modes of operation:
//! - `list`: Print registered tasks and robot presets
//! - `show`: Print a task's env or agent config, with overrides applied
//! - `validate`: Validate one task or all of them
//! - `diff`: Print the fields in which two tasks differ
//! - `joints`: Print a robot's resolved per-joint table
//! - `lint`: Flag reward weights whose sign disagrees with their function

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, error};

use stride_core::config::to_toml_string;
use stride_core::diff::diff;
use stride_core::overrides::Override;
use stride_envs::TaskRegistry;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Typed configuration registry for legged-robot RL tasks.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Toml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print registered tasks and robot presets.
    List,

    /// Print a task's config.
    Show {
        /// Task name.
        task: String,

        /// Print the agent config instead of the env config.
        #[arg(short, long)]
        agent: bool,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = Format::Toml)]
        format: Format,

        /// Field override, e.g. `env.scene.num_envs=1024`. Repeatable.
        #[arg(short, long = "set", value_name = "PATH=VALUE")]
        overrides: Vec<Override>,
    },

    /// Validate a task, or every registered task.
    Validate {
        /// Task name; all tasks when omitted.
        task: Option<String>,

        /// Field override applied before validating. Repeatable.
        #[arg(short, long = "set", value_name = "PATH=VALUE")]
        overrides: Vec<Override>,
    },

    /// Print the fields in which `derived` differs from `base`.
    Diff {
        base: String,
        derived: String,

        /// Compare agent configs instead of env configs.
        #[arg(short, long)]
        agent: bool,
    },

    /// Print a robot preset's resolved joint table.
    Joints {
        /// Robot preset name.
        robot: String,
    },

    /// Check reward weight signs of a task.
    Lint {
        /// Task name.
        task: String,
    },
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_list(registry: &TaskRegistry) {
    println!("tasks:");
    for name in registry.names() {
        println!("  {name}");
    }
    println!();
    println!("robots:");
    for name in stride_assets::ROBOT_NAMES {
        println!("  {name}");
    }
}

fn run_show(
    registry: &TaskRegistry,
    task: &str,
    agent: bool,
    format: Format,
    overrides: &[Override],
) -> anyhow::Result<()> {
    let task = registry.load(task, overrides)?;
    let text = match (agent, format) {
        (false, Format::Toml) => to_toml_string(&task.env)?,
        (false, Format::Json) => serde_json::to_string_pretty(&task.env)?,
        (true, Format::Toml) => to_toml_string(&task.agent)?,
        (true, Format::Json) => serde_json::to_string_pretty(&task.agent)?,
    };
    println!("{text}");
    Ok(())
}

fn run_validate(
    registry: &TaskRegistry,
    task: Option<&str>,
    overrides: &[Override],
) -> anyhow::Result<()> {
    if let Some(name) = task {
        let task = registry.load(name, overrides)?;
        let resolved = task.resolve()?;
        println!(
            "{name}: ok (joints={}, rewards={}, height_scan_rays={}, max_episode_steps={})",
            resolved.action_dim(),
            resolved.rewards.len(),
            resolved.height_scan_rays,
            resolved.max_episode_steps
        );
        return Ok(());
    }

    if !overrides.is_empty() {
        bail!("overrides need a task name");
    }
    let mut failed = 0;
    for (name, result) in registry.validate_all() {
        match result {
            Ok(()) => println!("{name}: ok"),
            Err(e) => {
                error!(task = name, "validation failed");
                println!("{name}: {e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} task(s) failed validation");
    }
    Ok(())
}

fn run_diff(registry: &TaskRegistry, base: &str, derived: &str, agent: bool) -> anyhow::Result<()> {
    let changes = if agent {
        diff(registry.agent(base)?, registry.agent(derived)?)?
    } else {
        diff(registry.env(base)?, registry.env(derived)?)?
    };
    debug!(changes = changes.len(), "diffed configs");
    for change in &changes {
        println!("{change}");
    }
    Ok(())
}

fn run_joints(robot: &str) -> anyhow::Result<()> {
    let cfg = stride_assets::robot(robot)?;
    let resolved = cfg
        .resolve()
        .with_context(|| format!("resolving robot '{robot}'"))?;
    let show = |v: Option<f32>| v.map_or_else(|| "-".to_string(), |v| format!("{v}"));

    println!(
        "{:<28} {:<10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "joint", "group", "pos", "effort", "vel", "kp", "kd", "arm"
    );
    for joint in &resolved.joints {
        println!(
            "{:<28} {:<10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            joint.name,
            joint.group.as_deref().unwrap_or("-"),
            joint.init_pos,
            show(joint.effort_limit),
            show(joint.velocity_limit),
            show(joint.stiffness),
            show(joint.damping),
            show(joint.armature)
        );
    }
    println!();
    println!("usd: {}", cfg.spawn.usd_path.display());
    Ok(())
}

fn run_lint(registry: &TaskRegistry, task: &str) -> anyhow::Result<()> {
    let lints = registry.env(task)?.reward.lint_weight_signs();
    if lints.is_empty() {
        println!("{task}: no weight sign issues");
        return Ok(());
    }
    for lint in &lints {
        println!("{task}: {lint}");
    }
    bail!("{} reward weight(s) with unexpected sign", lints.len())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = TaskRegistry::builtin()?;

    match cli.command {
        Some(Commands::List) | None => {
            run_list(&registry);
            Ok(())
        }
        Some(Commands::Show {
            task,
            agent,
            format,
            overrides,
        }) => run_show(&registry, &task, agent, format, &overrides),
        Some(Commands::Validate { task, overrides }) => {
            run_validate(&registry, task.as_deref(), &overrides)
        }
        Some(Commands::Diff {
            base,
            derived,
            agent,
        }) => run_diff(&registry, &base, &derived, agent),
        Some(Commands::Joints { robot }) => run_joints(&robot),
        Some(Commands::Lint { task }) => run_lint(&registry, &task),
    }
}
