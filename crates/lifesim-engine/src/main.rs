//! Game session binary for Lifesim.
//!
//! Wires the event bus, the notification pipeline, a terminal stand-in for
//! the HUD, and the durable event log, then plays game events read from
//! stdin (one per line, plain text or JSON) in real time.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `lifesim-config.yaml` (or `LIFESIM_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Restore the event log from the save directory
//! 4. Install pipeline, log store, and log viewer on the bus
//! 5. Drive input and the pipeline clock until `:quit` or end of input
//! 6. Flush the display slot and save the log

mod error;
mod session;
mod terminal;

use std::path::PathBuf;
use std::time::Duration;

use lifesim_core::SessionConfig;
use lifesim_log::FileSaveStore;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::session::Session;

/// Application entry point for the game session.
///
/// # Errors
///
/// Returns an error if configuration, the save store, or input fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so this comes first to
    // pick up the configured level.
    let config_path = std::env::var("LIFESIM_CONFIG")
        .map_or_else(|_| PathBuf::from("lifesim-config.yaml"), PathBuf::from);
    let config = SessionConfig::load_or_default(&config_path).map_err(EngineError::from)?;
    config.validate().map_err(EngineError::from)?;

    // 2. Initialize structured logging on stderr; stdout is the HUD.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        config = %config_path.display(),
        dwell_ms = config.notifications.dwell_ms,
        settle_ms = config.notifications.settle_ms,
        tick_interval_ms = config.session.tick_interval_ms,
        save_dir = %config.session.save_dir.display(),
        "Configuration loaded"
    );

    // 3-4. Restore the log and wire the session.
    let saves = FileSaveStore::new(config.session.save_dir.clone());
    let session = Session::new(&config, Box::new(saves), std::io::stdout())?;

    // 5. Play.
    let input = BufReader::new(tokio::io::stdin());
    let interval = Duration::from_millis(config.session.tick_interval_ms);
    session::drive(&session, input, interval).await?;
    info!(logged = session.log().len(), "input finished");

    // 6. Flush and save.
    session.shutdown()?;

    Ok(())
}
