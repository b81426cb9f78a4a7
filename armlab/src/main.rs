//! # Arm Lab Runtime
//!
//! Builds the arm scene and runs it, in a window or headless. `--watch`
//! reloads the scene whenever the `--config` file changes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use armlab::app::{run_headless, AppContext};
use armlab::config::{self, SceneConfig};
use armlab::watcher::ConfigWatcher;
use clap::{Parser, ValueEnum};
use physics::TimestepMode;
use render::TracingRenderer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "armlab", version, about = "Robotic arm physics scene")]
struct Cli {
    /// Scene config (JSON). Stock scene when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Run without a window.
    #[arg(long)]
    headless: bool,
    /// Frames to run in headless mode.
    #[arg(long, default_value_t = 600)]
    frames: u64,
    /// Reload the scene when the config file changes.
    #[arg(long, requires = "config")]
    watch: bool,
    /// Override the config's timestep mode.
    #[arg(long, value_enum)]
    timestep: Option<TimestepArg>,
    /// Frames between headless renderer summaries.
    #[arg(long, value_name = "FRAMES", default_value_t = 60)]
    log_every: u64,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TimestepArg {
    Fixed,
    Display,
}

/// Execution mode configuration for the runtime
enum ExecutionMode {
    Windowed,
    Headless { frames: u64 },
}

/// Headless when asked for, or when built without the `window` feature.
fn determine_execution_mode(cli: &Cli) -> ExecutionMode {
    if cli.headless || cfg!(not(feature = "window")) {
        ExecutionMode::Headless { frames: cli.frames }
    } else {
        ExecutionMode::Windowed
    }
}

/// The `--timestep` override, taking the fixed step from the config.
fn timestep_override(arg: Option<TimestepArg>, config: &SceneConfig) -> Option<TimestepMode> {
    arg.map(|arg| match arg {
        TimestepArg::Display => TimestepMode::Display,
        TimestepArg::Fixed => TimestepMode::Fixed {
            step: config.timestep.step,
            max_substeps: config.timestep.max_substeps,
        },
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(path)?,
        None => SceneConfig::default(),
    };

    let watcher = if cli.watch {
        cli.config.as_deref().and_then(|path| match ConfigWatcher::start(path) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                error!("config watcher disabled: {err:#}");
                None
            }
        })
    } else {
        None
    };

    let timestep = timestep_override(cli.timestep, &config);

    match determine_execution_mode(&cli) {
        ExecutionMode::Headless { frames } => {
            let [width, height] = config.viewport;
            let renderer = TracingRenderer::new(width, height).with_log_interval(cli.log_every);
            let mut ctx = AppContext::new(config, renderer).context("failed to build the arm scene")?;
            if let Some(timestep) = timestep {
                ctx.set_timestep(timestep);
            }
            let summary = run_headless(&mut ctx, frames, watcher.as_ref());
            info!(?summary, "done");
            Ok(())
        }
        ExecutionMode::Windowed => run_windowed(config, timestep, watcher),
    }
}

#[cfg(feature = "window")]
fn run_windowed(
    config: SceneConfig,
    timestep: Option<TimestepMode>,
    watcher: Option<ConfigWatcher>,
) -> Result<()> {
    armlab::window::run(config, timestep, watcher)
}

#[cfg(not(feature = "window"))]
fn run_windowed(
    _config: SceneConfig,
    _timestep: Option<TimestepMode>,
    _watcher: Option<ConfigWatcher>,
) -> Result<()> {
    anyhow::bail!("built without the `window` feature; use --headless")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_interval_and_timestep_come_from_the_command_line() {
        let cli = Cli::try_parse_from(["armlab", "--headless", "--log-every", "5", "--timestep", "fixed"])
            .unwrap();
        assert_eq!(cli.log_every, 5);
        assert!(matches!(determine_execution_mode(&cli), ExecutionMode::Headless { frames: 600 }));

        let config = SceneConfig::default();
        assert_eq!(
            timestep_override(cli.timestep, &config),
            Some(TimestepMode::Fixed {
                step: config.timestep.step,
                max_substeps: config.timestep.max_substeps,
            })
        );
        assert_eq!(timestep_override(None, &config), None);

        let defaults = Cli::try_parse_from(["armlab"]).unwrap();
        assert_eq!(defaults.log_every, 60);
    }
}
