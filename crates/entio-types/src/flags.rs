//! Spawn flags: level-designer boolean options packed into a bitmask.

use serde::{Deserialize, Serialize};

/// Bitmask of designer-set options on an entity.
///
/// The meaning of individual bits depends on the entity kind; this layer
/// only stores the mask and answers membership queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnFlags(pub u32);

impl SpawnFlags {
    /// An empty mask.
    pub const NONE: Self = Self(0);

    /// Return the raw mask.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `true` if any bit of `flag` is set in this mask.
    pub const fn has(self, flag: u32) -> bool {
        self.0 & flag != 0
    }
}

impl From<u32> for SpawnFlags {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}
