//! Parent resolution: `"name[,attachment]"` to a parent handle.
//!
//! The name part goes through the ordinary target resolver, so special
//! tokens work as parents. When several entities match, the first in spawn
//! order is chosen; this tie-break is part of the contract.

use entio_types::EntityId;

use crate::resolver::{ResolveContext, resolve_first};
use crate::table::EntityTable;

/// A parsed, non-empty parent specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentSpec<'a> {
    /// Target pattern naming the parent.
    pub name: &'a str,
    /// Attachment point on the parent, if given.
    pub attachment: Option<&'a str>,
}

impl<'a> ParentSpec<'a> {
    /// Parse `"name"` or `"name,attachment"`. Returns `None` only for a
    /// spec that is empty after trimming, which means "clear the parent".
    /// The name may still be empty when an attachment is given.
    pub fn parse(spec: &'a str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        let (name, attachment) = match spec.split_once(',') {
            Some((name, attachment)) => (name.trim(), Some(attachment.trim())),
            None => (spec, None),
        };
        Some(Self {
            name,
            attachment: attachment.filter(|a| !a.is_empty()),
        })
    }
}

/// Outcome of resolving a parent specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentResolution {
    /// Empty spec: the parent should be cleared.
    Clear,
    /// The parent entity and optional attachment.
    Found {
        /// The chosen parent.
        parent: EntityId,
        /// Attachment point on the parent.
        attachment: Option<String>,
    },
    /// The name matched no live entity.
    Unresolved {
        /// The name that failed to resolve.
        name: String,
    },
}

/// Resolve a parent spec against the live table.
pub fn resolve_parent(table: &EntityTable, spec: &str, ctx: &ResolveContext) -> ParentResolution {
    let Some(parsed) = ParentSpec::parse(spec) else {
        return ParentResolution::Clear;
    };
    let found = if parsed.name.is_empty() {
        None
    } else {
        resolve_first(table, parsed.name, ctx)
    };
    match found {
        Some(parent) => ParentResolution::Found {
            parent,
            attachment: parsed.attachment.map(str::to_owned),
        },
        None => ParentResolution::Unresolved {
            name: parsed.name.to_owned(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    #[test]
    fn parses_spec_forms() {
        assert_eq!(ParentSpec::parse(""), None);
        assert_eq!(ParentSpec::parse("   "), None);
        assert_eq!(
            ParentSpec::parse(",hand"),
            Some(ParentSpec {
                name: "",
                attachment: Some("hand")
            })
        );
        assert_eq!(
            ParentSpec::parse("train"),
            Some(ParentSpec {
                name: "train",
                attachment: None
            })
        );
        assert_eq!(
            ParentSpec::parse(" train , wheel_fl "),
            Some(ParentSpec {
                name: "train",
                attachment: Some("wheel_fl")
            })
        );
        assert_eq!(
            ParentSpec::parse("train,"),
            Some(ParentSpec {
                name: "train",
                attachment: None
            })
        );
    }

    #[test]
    fn first_match_in_spawn_order_wins() {
        let mut table = EntityTable::new();
        let first = table
            .insert(Entity::new("prop").with_target_name("cart"))
            .unwrap();
        table
            .insert(Entity::new("prop").with_target_name("cart"))
            .unwrap();
        assert_eq!(
            resolve_parent(&table, "cart,hitch", &ResolveContext::default()),
            ParentResolution::Found {
                parent: first,
                attachment: Some("hitch".to_owned())
            }
        );
    }

    #[test]
    fn attachment_without_name_is_unresolved() {
        let mut table = EntityTable::new();
        table
            .insert(Entity::new("func_tracktrain").with_target_name("train"))
            .unwrap();
        assert_eq!(
            resolve_parent(&table, ",hitch", &ResolveContext::default()),
            ParentResolution::Unresolved {
                name: String::new()
            }
        );
    }

    #[test]
    fn wildcard_parent_names_use_prefix_rule() {
        let mut table = EntityTable::new();
        let train = table
            .insert(Entity::new("func_tracktrain").with_target_name("train_01"))
            .unwrap();
        assert_eq!(
            resolve_parent(&table, "train_*_rear", &ResolveContext::default()),
            ParentResolution::Found {
                parent: train,
                attachment: None
            }
        );
    }

    #[test]
    fn special_tokens_resolve_as_parents() {
        let mut table = EntityTable::new();
        let activator = table.insert(Entity::new("player")).unwrap();
        let ctx = ResolveContext::new(None, Some(activator));
        assert_eq!(
            resolve_parent(&table, "!activator", &ctx),
            ParentResolution::Found {
                parent: activator,
                attachment: None
            }
        );
    }

    #[test]
    fn empty_and_unresolved_specs() {
        let table = EntityTable::new();
        let ctx = ResolveContext::default();
        assert_eq!(resolve_parent(&table, "", &ctx), ParentResolution::Clear);
        assert_eq!(resolve_parent(&table, " \t", &ctx), ParentResolution::Clear);
        assert_eq!(
            resolve_parent(&table, "ghost", &ctx),
            ParentResolution::Unresolved {
                name: "ghost".to_owned()
            }
        );
    }
}
