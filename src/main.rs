use std::fs::File;
use std::path::PathBuf;
use std::sync::LazyLock;

use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{Config, WriteLogger};

mod airflow;
mod commands;

use anyhow::Result;
use commands::conn::model::ConnCommand;
use dirs::{config_dir, home_dir, state_dir};

/// Get the configuration file path using XDG Base Directory specification
/// Prefers XDG config location (~/.config/connrs/config.toml) but falls back to
/// legacy location (~/.connrs) if it exists and XDG doesn't
static CONFIG_FILE: LazyLock<PathBuf> = LazyLock::new(|| {
    let home = home_dir().unwrap_or_default();
    let xdg_config = config_dir()
        .unwrap_or_else(|| home.join(".config"))
        .join("connrs")
        .join("config.toml");

    if xdg_config.exists() {
        return xdg_config;
    }

    let legacy_config = home.join(".connrs");
    if legacy_config.exists() {
        legacy_config
    } else {
        xdg_config
    }
});

/// Get the state directory path using XDG Base Directory specification
/// Used for logs
pub fn get_state_dir() -> PathBuf {
    state_dir()
        .unwrap_or_else(|| home_dir().unwrap_or_default().join(".local").join("state"))
        .join("connrs")
}

#[derive(Parser)]
#[clap(name = "connrs", bin_name = "connrs", version, about)]
struct ConnrsApp {
    #[clap(subcommand)]
    command: ConnrsCommand,
}

#[derive(Parser)]
enum ConnrsCommand {
    /// Work with Airflow connections
    #[clap(subcommand)]
    Conn(ConnCommand),
}

impl ConnrsApp {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            ConnrsCommand::Conn(cmd) => cmd.run(),
        }
    }
}

fn setup_logging(log_level: &str) -> Result<()> {
    let log_dir = get_state_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join(format!(
        "connrs-debug-{}.log",
        chrono::Local::now().format("%Y%m%d%H%M%S")
    ));

    let log_level = match log_level.to_lowercase().as_str() {
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    WriteLogger::init(log_level, Config::default(), File::create(&log_file_path)?)?;
    info!("Logging to: {}", log_file_path.display());
    Ok(())
}

fn main() -> Result<()> {
    if let Ok(log_level) = std::env::var("CONNRS_LOG") {
        setup_logging(&log_level)?;
    }

    let app = ConnrsApp::parse();
    app.run()
}
