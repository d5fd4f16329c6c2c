use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::RecvTimeoutError,
        Arc,
    },
    time::Duration,
};

use clap::{Parser, Subcommand};
use rockband_keys::{available_devices, list_devices, KeyboardError, KeysConfig, RockBandKeyboard};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(
    name = "rockband-keys",
    version,
    about = "Print events from a Rock Band keyboard dongle"
)]
struct Cli {
    /// Log filter such as `debug` or `rockband_keys=trace`; falls back to
    /// RUST_LOG, then `info`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List connected keyboard dongles
    List {
        /// Show every USB device, not only dongles
        #[arg(long)]
        all: bool,
    },
    /// Print decoded events until interrupted
    Monitor {
        /// Device path as printed by `list`, e.g. 001:004
        #[arg(long)]
        device: Option<String>,
        /// YAML transport configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = match cli.command {
        Command::List { all } => list(all),
        Command::Monitor { device, config } => monitor(device, config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "exiting");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list(all: bool) -> Result<(), KeyboardError> {
    let devices = if all {
        list_devices()?
    } else {
        available_devices()?
    };

    if devices.is_empty() {
        info!("no matching devices found");
    }
    for device in devices {
        let label = if device.is_keyboard_dongle() {
            "  rock band keyboard"
        } else {
            ""
        };
        println!(
            "{}  {:04x}:{:04x}{label}",
            device.path, device.vendor_id, device.product_id
        );
    }
    Ok(())
}

fn monitor(device: Option<String>, config_path: Option<PathBuf>) -> Result<(), KeyboardError> {
    let mut config = match config_path {
        Some(path) => KeysConfig::load(path)?,
        None => KeysConfig::default(),
    };
    if device.is_some() {
        config.device = device;
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .map_err(|err| KeyboardError::Thread(err.to_string()))?;

    let mut keyboard = RockBandKeyboard::connect(&config)?;
    let rx = keyboard.subscribe();
    let running = keyboard.start()?;

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => println!("{event}"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if interrupted.load(Ordering::SeqCst) {
            info!("interrupted, closing dongle");
            return running.close();
        }
        if running.is_finished() {
            break;
        }
    }

    for event in rx.try_iter() {
        println!("{event}");
    }
    running.wait()
}
