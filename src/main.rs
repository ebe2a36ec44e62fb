//! PagePilot - goal-driven browser action planner
//!
//! Main entry point for the PagePilot CLI.

mod cli;
mod cmd_config;
mod cmd_plan;
mod setup;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pagepilot_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};

use cli::{Cli, Commands, DEFAULT_CONFIG_PATH};

/// User-level configuration file, used when the default path is absent.
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pagepilot").join("config.toml"))
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return Ok(ConfigLoader::load(path)?);
    }
    if path != Path::new(DEFAULT_CONFIG_PATH) {
        bail!("Configuration file not found: {}", path.display());
    }
    match user_config_path().filter(|p| p.exists()) {
        Some(user_path) => Ok(ConfigLoader::load(&user_path)?),
        None => Ok(Config::default()),
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Stdout carries command output, so logs go to stderr
    let console = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let file = match &logging.directory {
        Some(directory) => {
            let log_dir = PathBuf::from(ConfigLoader::expand_path(directory));
            std::fs::create_dir_all(&log_dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("pagepilot")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

/// Log config problems; only planning refuses to start on errors.
fn check_config(config: &Config, strict: bool) -> Result<()> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if let (true, Some(error)) = (strict, result.errors.first()) {
        bail!(
            "Invalid configuration at {}: {} (run `pagepilot check-config` for details)",
            error.path,
            error.message
        );
    }
    for error in &result.errors {
        warn!("Config {}: {}", error.path, error.message);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_tracing(&config.logging)?;
    debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Commands::Plan { snapshot, user_id } => {
            check_config(&config, true)?;
            cmd_plan::run_plan(&config, &snapshot, user_id).await
        }
        Commands::Prompt { snapshot } => {
            check_config(&config, false)?;
            cmd_plan::run_prompt(&config, &snapshot).await
        }
        Commands::Rank { snapshot } => {
            check_config(&config, false)?;
            cmd_plan::run_rank(&config, &snapshot).await
        }
        Commands::CheckConfig => cmd_config::run_check_config(&config),
    }
}
