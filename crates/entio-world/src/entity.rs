//! The entity: identity, designer data, and owned I/O state.
//!
//! An [`Entity`] owns its output registry and the set of deliveries it has
//! scheduled but not yet seen delivered. Its parent link is a plain handle;
//! the table keeps it consistent when entities are destroyed.

use std::collections::{BTreeMap, BTreeSet};

use entio_types::{DeliveryId, EntityDefinition, EntityId, OutputDefinition, SpawnFlags};
use serde::{Deserialize, Serialize};

/// An addressable simulation object as seen by the I/O layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    class_name: String,
    target_name: Option<String>,
    spawn_flags: SpawnFlags,
    parent: Option<EntityId>,
    parent_attachment: Option<String>,
    world_model: Option<String>,
    outputs: Vec<OutputDefinition>,
    /// Deliveries this entity scheduled that are still outstanding.
    #[serde(skip)]
    pending_deliveries: BTreeSet<DeliveryId>,
    keyvalues: BTreeMap<String, String>,
}

impl Entity {
    /// Create a bare entity of the given class with a fresh handle.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            class_name: class_name.into(),
            target_name: None,
            spawn_flags: SpawnFlags::NONE,
            parent: None,
            parent_attachment: None,
            world_model: None,
            outputs: Vec::new(),
            pending_deliveries: BTreeSet::new(),
            keyvalues: BTreeMap::new(),
        }
    }

    /// Build an entity from level data.
    ///
    /// The parent spec is not applied here: parents are names and can only
    /// be resolved once every entity of the level exists.
    pub fn from_definition(definition: &EntityDefinition, outputs: Vec<OutputDefinition>) -> Self {
        let mut entity = Self::new(definition.classname.clone());
        entity.target_name = definition.targetname.clone().filter(|name| !name.is_empty());
        entity.spawn_flags = SpawnFlags(definition.spawnflags);
        entity.world_model = definition.model.clone();
        entity.outputs = outputs;
        entity.keyvalues = definition.keyvalues.clone();
        entity
    }

    /// Set the target name.
    #[must_use]
    pub fn with_target_name(mut self, name: impl Into<String>) -> Self {
        self.target_name = Some(name.into());
        self
    }

    /// Set the spawn flags.
    #[must_use]
    pub const fn with_spawn_flags(mut self, flags: u32) -> Self {
        self.spawn_flags = SpawnFlags(flags);
        self
    }

    /// Append an output definition.
    #[must_use]
    pub fn with_output(mut self, output: OutputDefinition) -> Self {
        self.outputs.push(output);
        self
    }

    /// Set the world model reference.
    #[must_use]
    pub fn with_world_model(mut self, model: impl Into<String>) -> Self {
        self.world_model = Some(model.into());
        self
    }

    /// The entity's handle.
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// The entity kind.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The designer-assigned name, if any.
    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// Spawn flag mask.
    pub const fn spawn_flags(&self) -> SpawnFlags {
        self.spawn_flags
    }

    /// `(spawn_flags & flag) != 0`.
    pub const fn has_spawn_flag(&self, flag: u32) -> bool {
        self.spawn_flags.has(flag)
    }

    /// Current parent handle.
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Attachment point on the parent, if the link names one.
    pub fn parent_attachment(&self) -> Option<&str> {
        self.parent_attachment.as_deref()
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<EntityId>, attachment: Option<String>) {
        self.parent = parent;
        self.parent_attachment = if parent.is_some() { attachment } else { None };
    }

    /// World model reference, if any.
    pub fn world_model(&self) -> Option<&str> {
        self.world_model.as_deref()
    }

    /// Raw key/value from level data.
    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.keyvalues.get(key).map(String::as_str)
    }

    /// Configured outputs in definition order.
    pub fn outputs(&self) -> &[OutputDefinition] {
        &self.outputs
    }

    /// Mutable access to one output by position.
    pub fn output_mut(&mut self, index: usize) -> Option<&mut OutputDefinition> {
        self.outputs.get_mut(index)
    }

    /// Append an output at runtime.
    pub fn add_output(&mut self, output: OutputDefinition) {
        self.outputs.push(output);
    }

    /// Reset the fired counter of every output.
    pub fn reset_outputs(&mut self) {
        for output in &mut self.outputs {
            output.reset();
        }
    }

    /// Handles of deliveries this entity has outstanding.
    pub const fn pending_deliveries(&self) -> &BTreeSet<DeliveryId> {
        &self.pending_deliveries
    }

    /// Record a delivery this entity scheduled.
    pub fn track_delivery(&mut self, delivery: DeliveryId) {
        self.pending_deliveries.insert(delivery);
    }

    /// Forget a delivery once it has been delivered or cancelled.
    pub fn forget_delivery(&mut self, delivery: DeliveryId) -> bool {
        self.pending_deliveries.remove(&delivery)
    }

    /// Remove and return every outstanding delivery handle.
    pub fn take_pending_deliveries(&mut self) -> BTreeSet<DeliveryId> {
        std::mem::take(&mut self.pending_deliveries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spawn_flag_test_is_bitwise() {
        let entity = Entity::new("func_door").with_spawn_flags(0x05);
        assert!(entity.has_spawn_flag(0x01));
        assert!(entity.has_spawn_flag(0x04));
        assert!(!entity.has_spawn_flag(0x02));

        let entity = Entity::new("func_door").with_spawn_flags(0x04);
        assert!(!entity.has_spawn_flag(0x01));
    }

    #[test]
    fn from_definition_copies_designer_data() {
        let definition = EntityDefinition {
            classname: "logic_relay".to_owned(),
            targetname: Some(String::new()),
            spawnflags: 2,
            parent: Some("train".to_owned()),
            model: Some("*3".to_owned()),
            outputs: Vec::new(),
            keyvalues: BTreeMap::from([("StartDisabled".to_owned(), "1".to_owned())]),
        };
        let entity = Entity::from_definition(
            &definition,
            vec![OutputDefinition::new("OnTrigger", "door", "Open")],
        );
        assert_eq!(entity.class_name(), "logic_relay");
        // An empty name is the same as no name.
        assert_eq!(entity.target_name(), None);
        assert!(entity.has_spawn_flag(2));
        assert_eq!(entity.world_model(), Some("*3"));
        assert_eq!(entity.key_value("StartDisabled"), Some("1"));
        assert_eq!(entity.outputs().len(), 1);
        assert_eq!(entity.parent(), None);
    }

    #[test]
    fn clearing_parent_drops_attachment() {
        let mut entity = Entity::new("prop");
        let parent = EntityId::new();
        entity.set_parent_link(Some(parent), Some("hand".to_owned()));
        assert_eq!(entity.parent_attachment(), Some("hand"));
        entity.set_parent_link(None, Some("hand".to_owned()));
        assert_eq!(entity.parent(), None);
        assert_eq!(entity.parent_attachment(), None);
    }

    #[test]
    fn delivery_tracking() {
        let mut entity = Entity::new("logic_relay");
        let delivery = DeliveryId::new();
        entity.track_delivery(delivery);
        assert!(entity.pending_deliveries().contains(&delivery));
        assert!(entity.forget_delivery(delivery));
        assert!(!entity.forget_delivery(delivery));
        entity.track_delivery(delivery);
        assert_eq!(entity.take_pending_deliveries().len(), 1);
        assert!(entity.pending_deliveries().is_empty());
    }

    #[test]
    fn snapshot_serializes_without_runtime_handles() {
        let mut entity = Entity::new("logic_relay").with_target_name("relay");
        entity.track_delivery(DeliveryId::new());
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["target_name"], "relay");
        assert!(json.get("pending_deliveries").is_none());
    }
}
