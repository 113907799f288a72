//! Khoji daemon
//!
//! Loads the configuration, installs the Ctrl-C handler and runs missions
//! on the simulated robot (or a real RFID reader with the `serial` feature).

use khoji::{App, Config, Error, Result};
use std::env;
use std::path::Path;

/// Config file looked up in the working directory when none is given
const DEFAULT_CONFIG: &str = "khoji.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `khoji <path>` (positional)
/// - `khoji --config <path>` (flag-based)
/// - `khoji -c <path>` (short flag)
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn load_config() -> Result<(Config, String)> {
    match parse_config_path() {
        Some(path) => Ok((Config::load(&path)?, path)),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            Ok((Config::load(DEFAULT_CONFIG)?, DEFAULT_CONFIG.to_string()))
        }
        None => {
            let config = Config::default();
            config.validate()?;
            Ok((config, "built-in defaults".to_string()))
        }
    }
}

fn main() -> Result<()> {
    let (config, source) = load_config()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("Khoji v{} starting", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", source);

    let app = App::new(config);

    let shared = app.shared();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        shared.signal_shutdown();
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let report = app.run()?;
    log::info!(
        "Exiting after {} mission(s) ({} ticks)",
        report.missions,
        report.ticks
    );
    Ok(())
}
