//! Level-logic entity behaviors shipped with the engine.
//!
//! - `logic_auto` fires `OnMapSpawn` once the level has spawned.
//! - `logic_relay` fires `OnTrigger` when it receives `Trigger`, and can be
//!   enabled, disabled, or toggled.
//!
//! Every other class gets the base inputs only.

use entio_core::{
    HandlerFactory, InputEffects, InputEvent, InputHandler, IoSystem, TimerService,
    handle_base_input,
};
use entio_types::EntityId;
use entio_world::Entity;
use tracing::{debug, info};

/// Class name of the map-spawn relay.
pub const LOGIC_AUTO: &str = "logic_auto";

/// Class name of the trigger relay.
pub const LOGIC_RELAY: &str = "logic_relay";

/// Output `logic_auto` fires when the level starts.
pub const ON_MAP_SPAWN: &str = "OnMapSpawn";

/// Output `logic_relay` fires when triggered.
pub const ON_TRIGGER: &str = "OnTrigger";

/// `logic_relay` spawnflag: disable after the first trigger.
pub const SF_RELAY_FIRE_ONCE: u32 = 0x01;

/// Key/value that starts a `logic_relay` disabled when set to `1`.
const START_DISABLED: &str = "StartDisabled";

/// Relays `Trigger` to its `OnTrigger` output while enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicRelay {
    enabled: bool,
}

impl LogicRelay {
    /// Read the initial state from the entity's key/values.
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            enabled: entity.key_value(START_DISABLED) != Some("1"),
        }
    }

    /// Whether `Trigger` currently fires.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl InputHandler for LogicRelay {
    fn on_input_fired(
        &mut self,
        entity: &Entity,
        event: &InputEvent<'_>,
        effects: &mut InputEffects,
    ) -> bool {
        match event.name {
            "Trigger" => {
                if !self.enabled {
                    debug!(entity = %entity.id(), "disabled relay ignored trigger");
                    return true;
                }
                effects.fire_output(ON_TRIGGER, event.args.to_vec());
                if entity.has_spawn_flag(SF_RELAY_FIRE_ONCE) {
                    self.enabled = false;
                }
                true
            }
            "Enable" => {
                self.enabled = true;
                true
            }
            "Disable" => {
                self.enabled = false;
                true
            }
            "Toggle" => {
                self.enabled = !self.enabled;
                true
            }
            _ => handle_base_input(entity, event, effects),
        }
    }
}

/// Picks engine behaviors by class name.
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorFactory;

impl HandlerFactory for BehaviorFactory {
    fn create(&self, entity: &Entity) -> Option<Box<dyn InputHandler>> {
        match entity.class_name() {
            LOGIC_RELAY => Some(Box::new(LogicRelay::from_entity(entity))),
            _ => None,
        }
    }
}

/// Fire `OnMapSpawn` on every `logic_auto`, in spawn order.
///
/// Returns the total number of deliveries dispatched.
pub fn fire_map_spawn<T: TimerService>(io: &mut IoSystem<T>) -> usize {
    let autos: Vec<EntityId> = io
        .entities()
        .iter()
        .filter(|entity| entity.class_name() == LOGIC_AUTO)
        .map(Entity::id)
        .collect();

    let mut dispatched: usize = 0;
    for id in &autos {
        dispatched = dispatched.saturating_add(io.fire_output(*id, ON_MAP_SPAWN, &[], Some(*id), None));
    }
    info!(logic_autos = autos.len(), dispatched, "map spawn outputs fired");
    dispatched
}
