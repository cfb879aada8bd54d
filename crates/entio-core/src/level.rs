//! Level loading: YAML level files to live entities.
//!
//! A level is spawned in two passes. The first creates every entity in list
//! order with its outputs and handler; the second applies parent specs,
//! which are names and can only resolve once the whole level exists.

use std::path::Path;

use entio_types::{ConnectionError, EntityId, LevelDefinition, OutputDefinition, OutputSpec};
use entio_world::Entity;
use tracing::info;

use crate::input::HandlerFactory;
use crate::io::{IoError, IoSystem, Reparent};
use crate::timer::TimerService;

/// Errors that can occur while loading or spawning a level.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// Failed to read the level file from disk.
    #[error("failed to read level file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse level YAML.
    #[error("failed to parse level YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An output connection string was malformed.
    #[error("entity #{index} ({classname}): {source}")]
    Connection {
        /// Position of the entity in the level.
        index: usize,
        /// Class name of the entity.
        classname: String,
        /// The parse failure.
        #[source]
        source: ConnectionError,
    },

    /// Spawning or parenting failed.
    #[error("failed to spawn level: {0}")]
    Spawn(#[from] IoError),
}

impl From<serde_yml::Error> for LevelError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Parse a level from a YAML string.
pub fn parse_level(yaml: &str) -> Result<LevelDefinition, LevelError> {
    if yaml.trim().is_empty() {
        return Ok(LevelDefinition::default());
    }
    Ok(serde_yml::from_str(yaml)?)
}

/// Read and parse a level file.
pub fn load_level_file(path: &Path) -> Result<LevelDefinition, LevelError> {
    let contents = std::fs::read_to_string(path)?;
    parse_level(&contents)
}

/// Spawn every entity of `level` into `io`, then apply parent specs.
///
/// Returns entity handles in level order.
///
/// # Errors
///
/// Returns [`LevelError::Connection`] for a malformed connection string
/// (nothing from the level is spawned in that case), or
/// [`LevelError::Spawn`] if a parent spec would create a cycle.
pub fn spawn_level<T: TimerService>(
    io: &mut IoSystem<T>,
    level: &LevelDefinition,
    factory: &dyn HandlerFactory,
) -> Result<Vec<EntityId>, LevelError> {
    let mut prepared = Vec::with_capacity(level.entities.len());
    for (index, definition) in level.entities.iter().enumerate() {
        let outputs = definition
            .outputs
            .iter()
            .cloned()
            .map(OutputSpec::into_definition)
            .collect::<Result<Vec<OutputDefinition>, _>>()
            .map_err(|source| LevelError::Connection {
                index,
                classname: definition.classname.clone(),
                source,
            })?;
        prepared.push(Entity::from_definition(definition, outputs));
    }

    let mut ids = Vec::with_capacity(prepared.len());
    for entity in prepared {
        let handler = factory.create(&entity);
        ids.push(io.spawn(entity, handler)?);
    }

    let mut parented: usize = 0;
    for (id, definition) in ids.iter().zip(&level.entities) {
        let Some(spec) = definition.parent.as_deref().filter(|spec| !spec.trim().is_empty()) else {
            continue;
        };
        if matches!(io.set_parent(*id, spec, None, None)?, Reparent::Attached { .. }) {
            parented = parented.saturating_add(1);
        }
    }

    info!(
        name = level.name.as_deref().unwrap_or("unnamed"),
        entities = ids.len(),
        parented,
        "level spawned"
    );
    Ok(ids)
}
