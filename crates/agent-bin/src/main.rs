//! FieldSense agent - delivers field sensor readings to the collection service.

mod app;
mod menu;

use agent_core::{init_logging, Config, TransportChoice};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FieldSense agent command-line interface.
#[derive(Parser)]
#[command(name = "fieldsense-agent")]
#[command(about = "Field-device telemetry agent for the FieldSense collection service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Collection service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Device serial number
    #[arg(long, global = true)]
    serial_number: Option<String>,

    /// Transport selection (auto, stream, http)
    #[arg(short, long, global = true)]
    transport: Option<TransportChoice>,

    /// Seconds between readings in continuous mode
    #[arg(short, long, global = true)]
    interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver readings continuously on the configured interval
    Run,
    /// Interactive device menu
    Menu,
    /// Take and deliver a single reading
    Once,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(serial_number) = cli.serial_number {
        config.serial_number = serial_number;
    }
    if let Some(transport) = cli.transport {
        config.transport = transport;
    }
    if let Some(secs) = cli.interval {
        config.send_interval_secs = secs;
    }
    config.validate()?;

    init_logging(&config.log_level);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            app::run_continuous(config).await?;
        }
        Commands::Menu => {
            menu::run_menu(config).await?;
        }
        Commands::Once => {
            let delivered = app::run_once(config).await?;
            if !delivered {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
