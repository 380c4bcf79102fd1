//! usb-lock-power
//!
//! Powers USB hub ports down on screen lock and back up on unlock.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use common::setup_logging;
use hubpower::config::PowerConfig;
use hubpower::events::{EventSource, LineEventSource, WatcherSource, run_bridge};
use hubpower::usb::RusbBus;
use hubpower::{PowerController, service};
use record::SaveFile;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};

/// Exit status when the event bridge stops on its own
const DAEMON_FAILURE_EXIT: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "usb-lock-power")]
#[command(
    author,
    version,
    about = "Power USB hub ports down on screen lock and back up on unlock"
)]
#[command(long_about = "
Switches off the hub ports of selected USB devices (keyboard, mouse, ...)
when the screen locks, and switches them back on when it unlocks. Ports that
were powered down are recorded in a save file so they can be restored even
after a restart.

EXAMPLES:
    # Power down the configured devices now
    usb-lock-power down

    # Restore whatever was powered down
    usb-lock-power up

    # Run as a background service fed by a lock watcher
    usb-lock-power daemon

    # Feed lock events by hand
    echo locked | usb-lock-power daemon --stdin

CONFIGURATION:
    The configuration is looked up in the following order:
    1. Path specified with --config
    2. ~/.config/usb-lock-power/config.toml
    3. /etc/usb-lock-power/config.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Override the save file location
    #[arg(long, value_name = "PATH", global = true)]
    save_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Power up every port recorded in the save file
    Up,
    /// Power down the ports of the configured devices
    Down,
    /// Wait for lock/unlock events and power ports down/up
    Daemon {
        /// Read events from standard input instead of the watcher command
        #[arg(long)]
        stdin: bool,
    },
    /// Show ports pending restore
    Status,
    /// List attached USB devices
    List,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = PowerConfig::default();
        let path = PowerConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let command = require_command(args.command).unwrap_or_else(|e| e.exit());

    let mut config = if let Some(ref path) = args.config {
        PowerConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        PowerConfig::load_or_default().context("Failed to load configuration")?
    };

    if let Some(save_file) = args.save_file {
        config.state.save_file = save_file;
    }

    // Use CLI log level if specified, otherwise use config value
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.daemon.log_level);

    setup_logging(log_level).context("Failed to setup logging")?;

    info!("usb-lock-power v{}", env!("CARGO_PKG_VERSION"));

    match command {
        Command::Up => {
            let report = controller(&config)?.power_up().context("Power up failed")?;
            if !report.restore_pending {
                info!("Nothing to restore");
            }
            Ok(())
        }
        Command::Down => {
            let report = controller(&config)?.power_down().context("Power down failed")?;
            for skipped in &report.skipped {
                info!("Skipped {}", skipped);
            }
            Ok(())
        }
        Command::Daemon { stdin } => daemon_mode(&config, stdin).await,
        Command::Status => status_mode(&config),
        Command::List => list_mode(&config),
    }
}

/// A command is required unless `--save-config` was given
fn require_command(command: Option<Command>) -> std::result::Result<Command, clap::Error> {
    command.ok_or_else(|| {
        Args::command().error(
            clap::error::ErrorKind::MissingSubcommand,
            "a command is required: up, down, daemon, status or list",
        )
    })
}

fn controller(config: &PowerConfig) -> Result<PowerController<RusbBus>> {
    let bus = RusbBus::new(config.usb.transfer_timeout()).context("Failed to initialize USB")?;
    Ok(PowerController::new(
        bus,
        SaveFile::new(&config.state.save_file),
        config.usb.devices.clone(),
    ))
}

/// Run the event bridge until it fails or Ctrl+C
async fn daemon_mode(config: &PowerConfig, stdin: bool) -> Result<()> {
    let names = config.daemon.notification_names();

    if stdin {
        info!("Reading lock events from standard input");
        run_daemon(config, LineEventSource::stdin(names)).await
    } else {
        let command = config.daemon.watcher_command.as_deref().context(
            "No watcher_command configured; set [daemon] watcher_command or use --stdin",
        )?;
        let source = WatcherSource::spawn(command, names).context("Failed to start watcher")?;
        run_daemon(config, source).await
    }
}

async fn run_daemon<S: EventSource>(config: &PowerConfig, mut source: S) -> Result<()> {
    let mut controller = controller(config)?;

    info!(
        "Watching {} device(s), save file {}",
        controller.targets().len(),
        controller.save_file().path().display()
    );

    if service::is_systemd() {
        info!("Running under systemd");
    }
    service::notify_ready().context("Failed to notify systemd ready")?;
    service::notify_status("Waiting for lock events")
        .context("Failed to send status to systemd")?;

    tokio::select! {
        result = run_bridge(&mut source, &mut controller) => {
            error!("Daemon stopping: {:?}", bridge_failure(result));
            if let Err(e) = service::notify_stopping() {
                error!("Failed to notify systemd stopping: {:#}", e);
            }
            std::process::exit(DAEMON_FAILURE_EXIT);
        }
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received Ctrl+C, shutting down..."),
                Err(e) => error!("Error waiting for Ctrl+C: {}", e),
            }
        }
    }

    service::notify_stopping().context("Failed to notify systemd stopping")?;
    Ok(())
}

/// run_bridge only returns on failure; turn its result into the reported error
fn bridge_failure(result: common::Result<()>) -> anyhow::Error {
    match result {
        Ok(()) => anyhow::anyhow!("event bridge stopped"),
        Err(e) => anyhow::Error::new(e),
    }
}

/// Print ports pending restore
fn status_mode(config: &PowerConfig) -> Result<()> {
    let save_file = SaveFile::new(&config.state.save_file);

    if !save_file.exists() {
        println!("Nothing to restore ({} not present).", save_file.path().display());
        return Ok(());
    }

    let records = save_file.load().context("Failed to read save file")?;
    println!(
        "{} port(s) pending restore in {}:\n",
        records.len(),
        save_file.path().display()
    );
    for record in records {
        println!("  {}", record);
    }

    Ok(())
}

/// List USB devices, marking configured targets
fn list_mode(config: &PowerConfig) -> Result<()> {
    let bus = RusbBus::new(config.usb.transfer_timeout()).context("Failed to initialize USB")?;
    let devices = bus.list_devices().context("Failed to list devices")?;

    if devices.is_empty() {
        println!("No USB devices found.");
        return Ok(());
    }

    println!("Found {} USB device(s):\n", devices.len());
    for device in devices {
        let target = config
            .usb
            .devices
            .iter()
            .any(|t| t.matches(device.vendor_id, device.product_id));
        let path = device
            .port_numbers
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(".");

        println!(
            "  {} {:04x}:{:04x}  Bus {:03} Device {:03}  Path [{}]{}",
            if target { "*" } else { " " },
            device.vendor_id,
            device.product_id,
            device.bus_number,
            device.device_address,
            path,
            if device.is_hub { "  (hub)" } else { "" }
        );
    }

    Ok(())
}
