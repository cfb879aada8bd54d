//! The live entity collection.
//!
//! [`EntityTable`] stores every live [`Entity`] by handle and remembers spawn
//! order, which is the stable enumeration order target resolution relies on.
//! Destroying an entity unlinks every child that named it as parent, so a
//! parent handle held by a live entity always refers to a live entity.

use std::collections::BTreeMap;

use entio_types::EntityId;
use tracing::debug;

use crate::entity::Entity;
use crate::error::WorldError;

/// An entity removed from the table, with the children it orphaned.
#[derive(Debug, Clone)]
pub struct DestroyedEntity {
    /// The removed entity, including any outstanding delivery handles.
    pub entity: Entity,
    /// Live entities whose parent link pointed at the removed entity.
    pub orphaned: Vec<EntityId>,
}

/// All live entities, enumerable in spawn order.
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    /// Live entities indexed by handle.
    entities: BTreeMap<EntityId, Entity>,
    /// Handles in spawn order.
    spawn_order: Vec<EntityId>,
}

impl EntityTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            spawn_order: Vec::new(),
        }
    }

    /// Insert a newly spawned entity at the end of the enumeration order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateEntity`] if the handle is already live.
    pub fn insert(&mut self, entity: Entity) -> Result<EntityId, WorldError> {
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(WorldError::DuplicateEntity(id));
        }
        self.entities.insert(id, entity);
        self.spawn_order.push(id);
        Ok(id)
    }

    /// Remove an entity and unlink its children.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`] if the entity is not live.
    pub fn remove(&mut self, id: EntityId) -> Result<DestroyedEntity, WorldError> {
        let entity = self.entities.remove(&id).ok_or(WorldError::EntityNotFound(id))?;
        self.spawn_order.retain(|live| *live != id);

        let mut orphaned = Vec::new();
        for (child_id, child) in &mut self.entities {
            if child.parent() == Some(id) {
                child.set_parent_link(None, None);
                orphaned.push(*child_id);
            }
        }
        if !orphaned.is_empty() {
            debug!(entity = %id, children = orphaned.len(), "destroyed parent, children unlinked");
        }

        Ok(DestroyedEntity { entity, orphaned })
    }

    /// `true` if the entity is live.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get an immutable reference to a live entity.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to a live entity.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// `true` if no entity is live.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate live entities in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.spawn_order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Handles of live entities in spawn order.
    pub fn ids(&self) -> &[EntityId] {
        &self.spawn_order
    }

    /// Live entities with exactly this target name, in spawn order.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.iter().filter(move |entity| entity.target_name() == Some(name))
    }

    /// Walk the parent chain of `id`, nearest ancestor first.
    ///
    /// The walk stops after visiting as many entities as the table holds,
    /// so even a corrupted chain cannot loop forever.
    pub fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut cursor = self.get(id).and_then(Entity::parent);
        while let Some(parent) = cursor {
            if chain.len() >= self.entities.len() {
                break;
            }
            chain.push(parent);
            cursor = self.get(parent).and_then(Entity::parent);
        }
        chain
    }

    /// Link `child` to `parent` (or clear the link with `None`).
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`] if either entity is not live,
    /// or [`WorldError::CyclicParent`] if `parent` is `child` or one of its
    /// descendants. On error the existing link is unchanged.
    pub fn set_parent(
        &mut self,
        child: EntityId,
        parent: Option<EntityId>,
        attachment: Option<String>,
    ) -> Result<(), WorldError> {
        if !self.contains(child) {
            return Err(WorldError::EntityNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(WorldError::EntityNotFound(parent));
            }
            if parent == child || self.ancestors(parent).contains(&child) {
                return Err(WorldError::CyclicParent { child, parent });
            }
        }

        let entity = self.get_mut(child).ok_or(WorldError::EntityNotFound(child))?;
        entity.set_parent_link(parent, attachment);
        Ok(())
    }

    /// Live children of `id`, in spawn order.
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.iter()
            .filter(|entity| entity.parent() == Some(id))
            .map(Entity::id)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn named(name: &str) -> Entity {
        Entity::new("info_target").with_target_name(name)
    }

    #[test]
    fn iteration_follows_spawn_order() {
        let mut table = EntityTable::new();
        let c = table.insert(named("c")).unwrap();
        let a = table.insert(named("a")).unwrap();
        let b = table.insert(named("b")).unwrap();
        let order: Vec<EntityId> = table.iter().map(Entity::id).collect();
        assert_eq!(order, vec![c, a, b]);

        table.remove(a).unwrap();
        let order: Vec<EntityId> = table.iter().map(Entity::id).collect();
        assert_eq!(order, vec![c, b]);
        assert_eq!(table.ids(), &[c, b]);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut table = EntityTable::new();
        let entity = named("a");
        table.insert(entity.clone()).unwrap();
        assert_eq!(
            table.insert(entity.clone()),
            Err(WorldError::DuplicateEntity(entity.id()))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_missing_entity_errors() {
        let mut table = EntityTable::new();
        let ghost = EntityId::new();
        assert!(matches!(table.remove(ghost), Err(WorldError::EntityNotFound(id)) if id == ghost));
    }

    #[test]
    fn find_by_name_returns_all_matches() {
        let mut table = EntityTable::new();
        let first = table.insert(named("lamp")).unwrap();
        table.insert(named("switch")).unwrap();
        let second = table.insert(named("lamp")).unwrap();
        let found: Vec<EntityId> = table.find_by_name("lamp").map(Entity::id).collect();
        assert_eq!(found, vec![first, second]);
    }

    #[test]
    fn cycle_rejected_and_link_unchanged() {
        let mut table = EntityTable::new();
        let a = table.insert(named("a")).unwrap();
        let b = table.insert(named("b")).unwrap();
        let c = table.insert(named("c")).unwrap();

        table.set_parent(a, Some(b), None).unwrap();
        table.set_parent(b, Some(c), Some("socket".to_owned())).unwrap();

        assert_eq!(
            table.set_parent(c, Some(a), None),
            Err(WorldError::CyclicParent { child: c, parent: a })
        );
        assert_eq!(table.get(c).unwrap().parent(), None);
        assert_eq!(
            table.set_parent(a, Some(a), None),
            Err(WorldError::CyclicParent { child: a, parent: a })
        );
        assert_eq!(table.get(a).unwrap().parent(), Some(b));
        assert_eq!(table.ancestors(a), vec![b, c]);
        assert_eq!(table.get(b).unwrap().parent_attachment(), Some("socket"));
    }

    #[test]
    fn destroying_parent_orphans_children() {
        let mut table = EntityTable::new();
        let parent = table.insert(named("train")).unwrap();
        let child = table.insert(named("seat")).unwrap();
        table.set_parent(child, Some(parent), Some("seat0".to_owned())).unwrap();
        assert_eq!(table.children(parent), vec![child]);

        let destroyed = table.remove(parent).unwrap();
        assert_eq!(destroyed.orphaned, vec![child]);
        let child_entity = table.get(child).unwrap();
        assert_eq!(child_entity.parent(), None);
        assert_eq!(child_entity.parent_attachment(), None);
    }

    #[test]
    fn set_parent_on_missing_entities() {
        let mut table = EntityTable::new();
        let a = table.insert(named("a")).unwrap();
        let ghost = EntityId::new();
        assert_eq!(
            table.set_parent(a, Some(ghost), None),
            Err(WorldError::EntityNotFound(ghost))
        );
        assert_eq!(
            table.set_parent(ghost, None, None),
            Err(WorldError::EntityNotFound(ghost))
        );
    }
}
