//! Error types for the `entio-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use entio_types::EntityId;

/// Errors that can occur during entity-table operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The entity is not live in the table.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity with the same handle is already live.
    #[error("duplicate entity id: {0}")]
    DuplicateEntity(EntityId),

    /// Re-parenting was rejected because it would close a cycle.
    #[error("parenting {child} to {parent} would create a cycle")]
    CyclicParent {
        /// The entity being re-parented.
        child: EntityId,
        /// The rejected parent.
        parent: EntityId,
    },
}
