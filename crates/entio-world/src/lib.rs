//! Entity table, target resolution, and parenting for the entity I/O layer.
//!
//! This crate models the live entity collection the I/O core reads and
//! mutates: entities with their output registries, the spawn-ordered table
//! that enumerates them, the pure target resolver, and cycle-checked
//! parenting.
//!
//! # Modules
//!
//! - [`entity`] -- [`Entity`] with its outputs, flags, parent link, and
//!   outstanding delivery handles.
//! - [`error`] -- Error types for table and parenting operations.
//! - [`parent`] -- `"name[,attachment]"` parsing and parent resolution.
//! - [`resolver`] -- Target-name resolution with special tokens and wildcards.
//! - [`table`] -- [`EntityTable`]: live entities in spawn order.

pub mod entity;
pub mod error;
pub mod parent;
pub mod resolver;
pub mod table;

// Re-export primary types at crate root.
pub use entity::Entity;
pub use error::WorldError;
pub use parent::{ParentResolution, ParentSpec, resolve_parent};
pub use resolver::{PLAYER_CLASS, ResolveContext, resolve, resolve_first};
pub use table::{DestroyedEntity, EntityTable};
