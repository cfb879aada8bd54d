//! Output firing, input routing, and delayed delivery for the entity I/O
//! layer.
//!
//! This crate drives the entity graph described by `entio-world`: outputs
//! resolve their targets and either deliver inputs synchronously or hand
//! them to the dispatch scheduler, which delivers them as game time
//! advances.
//!
//! # Modules
//!
//! - [`clock`] -- Game clock with tick counter and checked time arithmetic.
//! - [`config`] -- Configuration loading from `entio-config.yaml` into
//!   strongly-typed structs.
//! - [`input`] -- [`InputHandler`] capability, base inputs, and the effects
//!   buffer handlers write into.
//! - [`io`] -- [`IoSystem`]: the public firing API.
//! - [`level`] -- YAML level loading and two-pass spawning.
//! - [`scheduler`] -- [`DispatchScheduler`] owning pending deliveries.
//! - [`timer`] -- [`TimerService`] abstraction and the default deadline queue.
//!
//! [`InputHandler`]: input::InputHandler
//! [`IoSystem`]: io::IoSystem
//! [`DispatchScheduler`]: scheduler::DispatchScheduler
//! [`TimerService`]: timer::TimerService

pub mod clock;
pub mod config;
pub mod input;
pub mod io;
pub mod level;
pub mod scheduler;
pub mod timer;

pub use clock::{ClockError, GameClock};
pub use config::{
    ConfigError, EngineConfig, IoConfig, LEVEL_PATH_ENV, LoggingConfig, SimulationBoundsConfig,
    WorldConfig,
};
pub use input::{
    BaseEntity, BaseFactory, HandlerFactory, InputEffect, InputEffects, InputEvent, InputHandler,
    handle_base_input,
};
pub use io::{IoError, IoSystem, Reparent, TickSummary};
pub use level::{LevelError, load_level_file, parse_level, spawn_level};
pub use scheduler::{Delivery, DispatchScheduler, PendingDelivery};
pub use timer::{DeadlineQueue, TimerHandle, TimerService};
