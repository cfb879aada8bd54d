//! Target-name resolution.
//!
//! [`resolve`] turns a target pattern plus the firing context into the
//! concrete receivers, in spawn order, each at most once. It holds no state
//! and never fails: a pattern nothing matches yields an empty list, which
//! callers treat as a warning rather than an error.

use entio_types::{EntityId, SpecialTarget, TargetPattern};

use crate::entity::Entity;
use crate::table::EntityTable;

/// Class name `!player` resolves against.
pub const PLAYER_CLASS: &str = "player";

/// The entities a special token can refer to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveContext {
    /// The entity doing the resolving (`!self`).
    pub this: Option<EntityId>,
    /// The entity directly responsible (`!caller`).
    pub caller: Option<EntityId>,
    /// The entity originally responsible (`!activator`).
    pub activator: Option<EntityId>,
}

impl ResolveContext {
    /// A context with no firing entity: `!self` falls back to the caller.
    pub const fn new(caller: Option<EntityId>, activator: Option<EntityId>) -> Self {
        Self {
            this: None,
            caller,
            activator,
        }
    }

    /// A context resolved on behalf of `this`.
    pub const fn for_entity(
        this: EntityId,
        caller: Option<EntityId>,
        activator: Option<EntityId>,
    ) -> Self {
        Self {
            this: Some(this),
            caller,
            activator,
        }
    }

    /// The entity `!self` names.
    pub fn self_entity(&self) -> Option<EntityId> {
        self.this.or(self.caller)
    }
}

/// Resolve `pattern` to live receivers, in spawn order, without duplicates.
pub fn resolve(table: &EntityTable, pattern: &str, ctx: &ResolveContext) -> Vec<EntityId> {
    match TargetPattern::parse(pattern) {
        TargetPattern::Empty | TargetPattern::UnknownSpecial(_) => Vec::new(),
        TargetPattern::Special(special) => resolve_special(table, special, ctx)
            .into_iter()
            .collect(),
        named @ (TargetPattern::Exact(_) | TargetPattern::Wildcard(_)) => table
            .iter()
            .filter(|entity| entity.target_name().is_some_and(|name| named.matches_name(name)))
            .map(Entity::id)
            .collect(),
    }
}

/// Resolve `pattern` and keep only the first receiver in spawn order.
pub fn resolve_first(table: &EntityTable, pattern: &str, ctx: &ResolveContext) -> Option<EntityId> {
    resolve(table, pattern, ctx).into_iter().next()
}

fn resolve_special(
    table: &EntityTable,
    special: SpecialTarget,
    ctx: &ResolveContext,
) -> Option<EntityId> {
    let candidate = match special {
        SpecialTarget::SelfEntity => ctx.self_entity(),
        SpecialTarget::Caller => ctx.caller,
        SpecialTarget::Activator => ctx.activator,
        SpecialTarget::Player => table
            .iter()
            .find(|entity| entity.class_name() == PLAYER_CLASS)
            .map(Entity::id),
    };
    candidate.filter(|id| table.contains(*id))
}
