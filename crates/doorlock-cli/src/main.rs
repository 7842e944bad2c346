//! `doorlock` - run the door-access controller on a terminal.
//!
//! Keypad and fingerprint input come from standard input, the display is
//! rendered to the log, and the supervisor link is optional.

use anyhow::Context;
use clap::Parser;
use doorlock_cli::{
    ConsoleActuator, DoorlockConfig, SimulatedSensor, config::ConfigError, init_logging,
    spawn_stdin_reader,
};
use doorlock_controller::{AccessController, Peripherals, VirtualDisplay};
use doorlock_network::TcpRemoteChannel;
use doorlock_protocol::{OfflineChannel, RemoteChannel};
use doorlock_storage::{Database, SqliteCredentialStore};
use std::{path::PathBuf, time::Duration};
use tokio::signal;
use tracing::{error, info};

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - door access controller");

#[derive(Debug, Parser)]
#[command(version = env!("CARGO_PKG_VERSION"), about = PKG_DESCRIPTION)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log filter, e.g. "debug" or "doorlock=trace"
    #[arg(long = "log-level", short = 'l')]
    log_level: Option<String>,
    /// SQLite database holding the password
    #[arg(long = "database", short = 'd', value_name = "PATH")]
    database: Option<String>,
    /// Supervisor address (<host>:<port>); enables the remote link
    #[arg(long = "supervisor", short = 's', value_name = "ADDR")]
    supervisor: Option<String>,
    /// Run without the supervisor link
    #[arg(long = "offline", conflicts_with = "supervisor")]
    offline: bool,
}

impl Cli {
    fn apply(&self, config: &mut DoorlockConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(path) = &self.database {
            config.storage.database_path = path.clone();
        }
        if let Some(addr) = &self.supervisor {
            config.remote.enabled = true;
            config.remote.server_addr = addr.clone();
        }
        if self.offline {
            config.remote.enabled = false;
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<(DoorlockConfig, Option<PathBuf>), ConfigError> {
    let (mut config, source) = DoorlockConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;
    Ok((config, source))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, source) = resolve_config(&cli).context("Failed to load configuration")?;

    init_logging(Some(&config.general.log_level));
    match &source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    let db = Database::new(config.database_config())
        .await
        .with_context(|| format!("Failed to open {}", config.storage.database_path))?;
    let store = SqliteCredentialStore::with_namespace(db.pool().clone(), &config.storage.namespace);

    if config.remote.enabled {
        info!("Supervisor link to {}", config.remote.server_addr);
        run_controller(&config, store, TcpRemoteChannel::spawn(config.link_config())).await;
    } else {
        info!("Running without supervisor link");
        run_controller(&config, store, OfflineChannel).await;
    }

    db.close().await;
    info!("Shut down");
    Ok(())
}

async fn run_controller<R: RemoteChannel>(
    config: &DoorlockConfig,
    store: SqliteCredentialStore,
    remote: R,
) {
    let inputs = spawn_stdin_reader();
    let peripherals = Peripherals {
        keypad: inputs.keypad,
        sensor: SimulatedSensor::new(
            inputs.sensor_commands,
            Duration::from_millis(config.timing.capture_timeout_ms),
        ),
        display: VirtualDisplay::default(),
        actuator: ConsoleActuator::new(Duration::from_millis(config.timing.open_hold_ms)),
    };

    let mut controller =
        AccessController::new(peripherals, store, remote, config.controller_config());
    controller.run(shutdown_signal()).await;

    inputs.reader.abort();
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received, shutting down"),
        Err(e) => {
            // Without a signal handler only killing the process stops it.
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
