//! Tick loop driver.
//!
//! [`run_level`] advances the I/O clock one tick interval at a time until a
//! run boundary is reached:
//!
//! - **Bounded run**: stop after `max_ticks` ticks (0 means unbounded)
//! - **Idle stop**: stop once no delivery is pending, if enabled
//! - **Interrupt**: Ctrl-C while sleeping between real-time ticks

use std::time::Duration;

use entio_core::{IoError, IoSystem, SimulationBoundsConfig, TickSummary, TimerService, WorldConfig};
use tracing::{debug, info, warn};

/// Errors that can occur during the run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
}

/// Why the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Nothing was left to deliver.
    Idle,
    /// The process received Ctrl-C.
    Interrupted,
}

/// Result of a run.
#[derive(Debug)]
pub struct RunResult {
    /// The reason the run ended.
    pub end_reason: RunEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Scheduled deliveries made over the whole run.
    pub delivered: usize,
}

/// Run the tick loop until a run boundary is reached.
///
/// # Errors
///
/// Returns [`RunnerError`] if game time arithmetic overflows.
pub async fn run_level<T: TimerService>(
    io: &mut IoSystem<T>,
    world: &WorldConfig,
    bounds: &SimulationBoundsConfig,
) -> Result<RunResult, RunnerError> {
    let interval = Duration::from_millis(world.tick_interval_ms);
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;
    let mut delivered: usize = 0;

    info!(
        max_ticks = bounds.max_ticks,
        stop_when_idle = bounds.stop_when_idle,
        tick_interval_ms = world.tick_interval_ms,
        real_time = world.real_time,
        pending = io.pending_deliveries(),
        "Run starting"
    );
    if bounds.max_ticks == 0 && !bounds.stop_when_idle {
        warn!("no run boundary configured, running until interrupted");
    }

    loop {
        let summary = io.advance(interval)?;
        total_ticks = total_ticks.saturating_add(1);
        delivered = delivered.saturating_add(summary.delivered);
        if summary.delivered > 0 {
            debug!(
                tick = summary.tick,
                delivered = summary.delivered,
                pending = summary.pending,
                "Tick delivered inputs"
            );
        }

        if bounds.max_ticks > 0 && total_ticks >= bounds.max_ticks {
            info!(tick = summary.tick, max_ticks = bounds.max_ticks, "Tick limit reached");
            return Ok(RunResult {
                end_reason: RunEndReason::MaxTicksReached,
                final_summary: Some(summary),
                total_ticks,
                delivered,
            });
        }

        if bounds.stop_when_idle && summary.pending == 0 {
            info!(tick = summary.tick, "No deliveries pending, stopping");
            return Ok(RunResult {
                end_reason: RunEndReason::Idle,
                final_summary: Some(summary),
                total_ticks,
                delivered,
            });
        }

        last_summary = Some(summary);

        if world.real_time && !interval.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received");
                    return Ok(RunResult {
                        end_reason: RunEndReason::Interrupted,
                        final_summary: last_summary,
                        total_ticks,
                        delivered,
                    });
                }
            }
        }
    }
}

/// Log the run end sequence.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        delivered = result.delivered,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Run ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            game_time_ms = summary.now.as_millis(),
            pending = summary.pending,
            "Final tick summary"
        );
    } else {
        warn!("Run ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use entio_core::IoConfig;
    use entio_types::OutputDefinition;
    use entio_world::Entity;

    use super::*;

    fn fast_world() -> WorldConfig {
        WorldConfig {
            tick_interval_ms: 100,
            real_time: false,
            ..WorldConfig::default()
        }
    }

    #[tokio::test]
    async fn stops_at_tick_limit() {
        let mut io = IoSystem::new(IoConfig::default());
        let bounds = SimulationBoundsConfig {
            max_ticks: 5,
            stop_when_idle: false,
        };
        let result = run_level(&mut io, &fast_world(), &bounds).await.unwrap();
        assert_eq!(result.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(io.now(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn stops_when_idle() {
        let mut io = IoSystem::new(IoConfig::default());
        io.spawn(Entity::new("prop_dynamic").with_target_name("lamp"), None)
            .unwrap();
        let relay = io
            .spawn(
                Entity::new("logic_relay")
                    .with_output(OutputDefinition::new("OnTrigger", "lamp", "Kill").with_delay(0.25)),
                None,
            )
            .unwrap();
        assert_eq!(io.fire_output(relay, "OnTrigger", &[], None, None), 1);

        let bounds = SimulationBoundsConfig {
            max_ticks: 100,
            stop_when_idle: true,
        };
        let result = run_level(&mut io, &fast_world(), &bounds).await.unwrap();
        assert_eq!(result.end_reason, RunEndReason::Idle);
        assert_eq!(result.total_ticks, 3);
        assert_eq!(result.delivered, 1);
        assert_eq!(io.entities().find_by_name("lamp").count(), 0);
    }
}
