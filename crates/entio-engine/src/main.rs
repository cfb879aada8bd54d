//! Level driver binary for the entity I/O layer.
//!
//! Loads configuration and a YAML level, spawns the level into an
//! [`IoSystem`], fires `OnMapSpawn` on every `logic_auto`, and runs the tick
//! loop until a run boundary is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `entio-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Load the level named by `world.level_path` or `ENTIO_LEVEL`
//! 4. Spawn entities and apply parents
//! 5. Fire `OnMapSpawn`
//! 6. Run the tick loop
//! 7. Log the result

mod behaviors;
mod error;
mod runner;

use std::path::Path;

use entio_core::{EngineConfig, IoSystem, LoggingConfig, load_level_file, spawn_level};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::behaviors::BehaviorFactory;
use crate::error::EngineError;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, level loading, or the tick loop fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("entio-engine starting");
    info!(
        world_name = config.world.name,
        level_path = config.world.level_path,
        tick_interval_ms = config.world.tick_interval_ms,
        max_dispatch_depth = config.io.max_dispatch_depth,
        "Configuration loaded"
    );

    // 3-5. Load, spawn, and start the level.
    let mut io = start_level(&config)?;

    // 6. Run the tick loop.
    let result = runner::run_level(&mut io, &config.world, &config.simulation)
        .await
        .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_run_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        entities = io.entities().len(),
        "entio-engine shutdown complete"
    );

    Ok(())
}

/// Load the engine configuration from `entio-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<EngineConfig, EngineError> {
    let config_path = Path::new("entio-config.yaml");
    if config_path.exists() {
        Ok(EngineConfig::from_file(config_path)?)
    } else {
        // Defaults still honor ENTIO_LEVEL.
        Ok(EngineConfig::parse("")?)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the configured level, spawn it, and fire `OnMapSpawn`.
fn start_level(config: &EngineConfig) -> Result<IoSystem, EngineError> {
    let level_path = Path::new(&config.world.level_path);
    let level = load_level_file(level_path)?;
    info!(
        path = %level_path.display(),
        name = level.name.as_deref().unwrap_or("unnamed"),
        entities = level.entities.len(),
        "Level loaded"
    );

    let mut io = IoSystem::new(config.io.clone());
    spawn_level(&mut io, &level, &BehaviorFactory)?;
    let dispatched = behaviors::fire_map_spawn(&mut io);
    info!(
        dispatched,
        pending = io.pending_deliveries(),
        "Level started"
    );
    Ok(io)
}
