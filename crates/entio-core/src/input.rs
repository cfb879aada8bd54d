//! The receiving side: input events, the handler capability, and effects.
//!
//! Entity kinds implement [`InputHandler`]. A handler sees the receiving
//! entity read-only and reports what it wants changed through
//! [`InputEffects`]; the I/O system applies those effects right after the
//! handler returns, still inside the same dispatch.
//!
//! The default [`InputHandler::on_input_fired`] implements the inputs every
//! entity understands (see [`handle_base_input`]).

use entio_types::{EntityId, OutputDefinition, parse_add_output};
use entio_world::Entity;
use tracing::warn;

/// Number of `FireUserN` / `OnUserN` pairs.
pub const USER_OUTPUTS: u8 = 4;

/// One input fire as seen by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent<'a> {
    /// Input name.
    pub name: &'a str,
    /// Arguments after substitution.
    pub args: &'a [String],
    /// The entity directly responsible.
    pub caller: Option<EntityId>,
    /// The entity originally responsible.
    pub activator: Option<EntityId>,
}

impl InputEvent<'_> {
    /// The first argument, or `""` when there is none.
    pub fn first_arg(&self) -> &str {
        self.args.first().map_or("", String::as_str)
    }
}

/// A change a handler asks the I/O system to make on its behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEffect {
    /// Fire one of the receiving entity's outputs. The receiver becomes the
    /// caller; the activator is passed through.
    FireOutput {
        /// Output name.
        name: String,
        /// Runtime arguments.
        args: Vec<String>,
    },
    /// Destroy the receiving entity.
    Destroy,
    /// Re-parent the receiving entity using a `"name[,attachment]"` spec.
    SetParent(String),
    /// Clear the receiving entity's parent.
    ClearParent,
    /// Append an output to the receiving entity.
    AddOutput(OutputDefinition),
}

/// Ordered buffer of effects requested by one handler call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputEffects {
    effects: Vec<InputEffect>,
}

impl InputEffects {
    /// An empty buffer.
    pub const fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Request that the receiver fire one of its outputs.
    pub fn fire_output(&mut self, name: impl Into<String>, args: Vec<String>) {
        self.effects.push(InputEffect::FireOutput {
            name: name.into(),
            args,
        });
    }

    /// Request that the receiver be destroyed.
    pub fn destroy(&mut self) {
        self.effects.push(InputEffect::Destroy);
    }

    /// Request a re-parent.
    pub fn set_parent(&mut self, spec: impl Into<String>) {
        self.effects.push(InputEffect::SetParent(spec.into()));
    }

    /// Request the parent be cleared.
    pub fn clear_parent(&mut self) {
        self.effects.push(InputEffect::ClearParent);
    }

    /// Request an output be added.
    pub fn add_output(&mut self, output: OutputDefinition) {
        self.effects.push(InputEffect::AddOutput(output));
    }

    /// `true` if nothing was requested.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Requested effects in order.
    pub fn as_slice(&self) -> &[InputEffect] {
        &self.effects
    }

    /// Consume the buffer.
    pub fn into_vec(self) -> Vec<InputEffect> {
        self.effects
    }
}

/// Entity-kind-specific input behavior.
///
/// Return `true` when the input was handled. Implementations that only add
/// a few inputs should fall back to [`handle_base_input`] for the rest.
pub trait InputHandler: Send {
    /// React to an input fired on `entity`.
    fn on_input_fired(
        &mut self,
        entity: &Entity,
        event: &InputEvent<'_>,
        effects: &mut InputEffects,
    ) -> bool {
        handle_base_input(entity, event, effects)
    }
}

/// Handler for entities without kind-specific behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseEntity;

impl InputHandler for BaseEntity {}

/// Creates handlers for entity kinds when a level is spawned.
pub trait HandlerFactory {
    /// A handler for `entity`, or `None` to use [`BaseEntity`].
    ///
    /// Called once per entity, after its key/values are known and before
    /// it is inserted into the table.
    fn create(&self, entity: &Entity) -> Option<Box<dyn InputHandler>>;
}

/// Factory that gives every entity the base behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseFactory;

impl HandlerFactory for BaseFactory {
    fn create(&self, _entity: &Entity) -> Option<Box<dyn InputHandler>> {
        None
    }
}

/// Inputs every entity understands.
///
/// - `Kill` -- destroy the entity.
/// - `SetParent <spec>` / `ClearParent` -- re-parent.
/// - `FireUser1`..`FireUser4` -- fire `OnUser1`..`OnUser4`.
/// - `AddOutput "<output> <target>:<input>:<param>:<delay>:<times>"`.
pub fn handle_base_input(entity: &Entity, event: &InputEvent<'_>, effects: &mut InputEffects) -> bool {
    match event.name {
        "Kill" => {
            effects.destroy();
            true
        }
        "SetParent" => {
            effects.set_parent(event.first_arg());
            true
        }
        "ClearParent" => {
            effects.clear_parent();
            true
        }
        "AddOutput" => match parse_add_output(event.first_arg()) {
            Ok(output) => {
                effects.add_output(output);
                true
            }
            Err(e) => {
                warn!(entity = %entity.id(), error = %e, "malformed AddOutput");
                false
            }
        },
        name => match user_output_for(name) {
            Some(output) => {
                effects.fire_output(output, event.args.to_vec());
                true
            }
            None => false,
        },
    }
}

/// Map `FireUserN` to `OnUserN` for `N` in `1..=USER_OUTPUTS`.
fn user_output_for(input: &str) -> Option<String> {
    let n: u8 = input.strip_prefix("FireUser")?.parse().ok()?;
    (1..=USER_OUTPUTS).contains(&n).then(|| format!("OnUser{n}"))
}
