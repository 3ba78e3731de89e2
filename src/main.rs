//! # CameraVision Bridge
//!
//! Drive a CameraVision pan/tilt camera from a joystick or gamepad.
//!
//! This application finds a controller, connects to the CameraVision command
//! port and forwards stick and button input as protocol tokens until the
//! controller goes away or Ctrl+C is pressed.
//!
//! # Exit Status
//!
//! - `0`: clean shutdown, or no controller found at startup
//! - `1`: configuration error, camera unreachable, or link failure
//! - `2`: controller disconnected while running
//!
//! # Examples
//!
//! ```bash
//! camvision-bridge --host camera-pi.local --port 2222
//! ```
//!
//! Expected output:
//! ```text
//! INFO camvision_bridge: CameraVision Bridge v0.1.0 starting...
//! INFO camvision_bridge::controller::gamepad: Found controller "Logitech Gamepad F310" at: /dev/input/event5
//! INFO camvision_bridge::transport: Connected to CameraVision at camera-pi.local:2222
//! INFO camvision_bridge::driver: Polling controller every 100 ms, sending to camera-pi.local:2222
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use camvision_bridge::config::Config;
use camvision_bridge::controller::gamepad::Gamepad;
use camvision_bridge::driver::{Driver, DriverSettings};
use camvision_bridge::error::{BridgeError, EXIT_FAILURE};
use camvision_bridge::transport::CameraLink;

/// Command line arguments
///
/// `-h` selects the host, so help is long-form only.
#[derive(Debug, Parser)]
#[command(name = "camvision-bridge", version)]
#[command(about = "Drive a CameraVision pan/tilt camera from a joystick or gamepad")]
#[command(disable_help_flag = true)]
struct Cli {
    /// Host running the CameraVision application
    #[arg(short = 'h', long)]
    host: Option<String>,

    /// CameraVision command port
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller event device (default: auto-detect)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over `--verbose`. The returned guard must live
/// until exit so buffered file output is flushed.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

/// Merge the config file with command line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(host) = &cli.host {
        config.connection.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.connection.port = port;
    }
    if let Some(device) = &cli.device {
        config.controller.device_path = device.to_string_lossy().to_string();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let gamepad = if config.controller.device_path.is_empty() {
        Gamepad::open()?
    } else {
        Gamepad::open_path(&config.controller.device_path)?
    };

    let settings = DriverSettings::from_config(&config);
    let bound: Vec<_> = settings.bindings.bindings().iter().map(|b| b.button).collect();
    for button in gamepad.missing_buttons(&bound) {
        warn!("Controller has no {:?} button, its binding will be skipped", button);
    }

    let link = CameraLink::connect(
        &config.connection.host,
        config.connection.port,
        config.connection.connect_timeout(),
    )
    .await?;

    info!("Press Ctrl+C to exit");

    let mut driver = Driver::new(gamepad, link, settings);
    driver
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

/// Main entry point for CameraVision Bridge
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    info!("CameraVision Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => {
            info!("Stopped");
            ExitCode::SUCCESS
        }
        Err(e) => match e.downcast_ref::<BridgeError>() {
            Some(BridgeError::ControllerNotFound) => {
                info!("No controller found!");
                ExitCode::SUCCESS
            }
            Some(bridge_error) => {
                error!("{:#}", e);
                ExitCode::from(bridge_error.exit_code())
            }
            None => {
                error!("{:#}", e);
                ExitCode::from(EXIT_FAILURE)
            }
        },
    }
}
