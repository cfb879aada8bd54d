//! Shared type definitions for the entity I/O layer.
//!
//! This crate holds the value types every other crate speaks: entity and
//! delivery handles, spawn flags, output definitions, target patterns, and
//! the level data a compiler produces.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity and delivery handles
//! - [`flags`] -- Spawn flag bitmask
//! - [`output`] -- Output connections with fire-limit bookkeeping
//! - [`target`] -- Target pattern classification and wildcard matching
//! - [`connection`] -- Source connection-string and `AddOutput` parsing
//! - [`level`] -- Level and entity definitions as loaded from disk

pub mod connection;
pub mod flags;
pub mod ids;
pub mod level;
pub mod output;
pub mod target;

// Re-export all public types at crate root for convenience.
pub use connection::{ConnectionError, parse_add_output, parse_connection};
pub use flags::SpawnFlags;
pub use ids::{DeliveryId, EntityId};
pub use level::{EntityDefinition, LevelDefinition, OutputSpec};
pub use output::{OutputDefinition, UNLIMITED_FIRES};
pub use target::{SpecialTarget, TargetPattern, wildcard_match};
