//! The entity I/O system: firing outputs, routing inputs, and delivering
//! delayed fires.
//!
//! [`IoSystem`] owns the live [`EntityTable`], one [`InputHandler`] per
//! entity, the [`DispatchScheduler`], and the [`GameClock`]. It is the public
//! surface a level-logic driver talks to:
//!
//! - [`IoSystem::fire_output`] -- fire a named output of an entity.
//! - [`IoSystem::fire_input`] -- fire a named input on an entity.
//! - [`IoSystem::reset_logic_outputs`] -- revive exhausted outputs and
//!   cancel the entity's pending deliveries.
//! - [`IoSystem::resolve_target_name`] -- resolve a target pattern.
//! - [`IoSystem::set_parent`] -- re-parent from a `"name[,attachment]"` spec.
//! - [`IoSystem::has_spawn_flag`] -- pure spawn-flag test.
//! - [`IoSystem::advance`] -- advance game time and deliver due fires.
//!
//! Empty target matches and exhausted fire limits are steady-state outcomes:
//! they are logged and skipped, never returned as errors. Only parenting and
//! clock arithmetic surface errors to the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use entio_types::{DeliveryId, EntityId, OutputDefinition};
use entio_world::{
    DestroyedEntity, Entity, EntityTable, ParentResolution, ResolveContext, WorldError, resolve,
    resolve_parent,
};
use tracing::{debug, info, trace, warn};

use crate::clock::{ClockError, GameClock};
use crate::config::IoConfig;
use crate::input::{BaseEntity, InputEffect, InputEffects, InputEvent, InputHandler};
use crate::scheduler::{Delivery, DispatchScheduler};
use crate::timer::{DeadlineQueue, TimerService};

/// Errors surfaced by the I/O system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IoError {
    /// The entity is not live.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity-table operation failed (including cyclic re-parenting).
    #[error("world error: {0}")]
    World(#[from] WorldError),

    /// Game time arithmetic failed.
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),
}

/// Outcome of a successful [`IoSystem::set_parent`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reparent {
    /// The spec was empty and the parent link was cleared.
    Cleared,
    /// The entity is now attached to `parent`.
    Attached {
        /// The new parent.
        parent: EntityId,
        /// Attachment point on the parent.
        attachment: Option<String>,
    },
    /// The name matched nothing; the parent link is unchanged.
    Unresolved {
        /// The name that failed to resolve.
        name: String,
    },
}

/// What one call to [`IoSystem::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Tick number just completed.
    pub tick: u64,
    /// Game time at the end of the tick.
    pub now: Duration,
    /// Scheduled deliveries that reached a live receiver.
    pub delivered: usize,
    /// Deliveries still pending after the tick.
    pub pending: usize,
}

/// Entity table plus output/input dispatch.
pub struct IoSystem<T = DeadlineQueue> {
    entities: EntityTable,
    handlers: BTreeMap<EntityId, Box<dyn InputHandler>>,
    scheduler: DispatchScheduler<T>,
    clock: GameClock,
    config: IoConfig,
    depth: u32,
}

impl IoSystem<DeadlineQueue> {
    /// Create an empty system backed by the default deadline queue.
    pub const fn new(config: IoConfig) -> Self {
        Self::with_timer(config, DeadlineQueue::new())
    }
}

impl<T: TimerService> IoSystem<T> {
    /// Create an empty system backed by a custom timer service.
    pub const fn with_timer(config: IoConfig, timer: T) -> Self {
        Self {
            entities: EntityTable::new(),
            handlers: BTreeMap::new(),
            scheduler: DispatchScheduler::new(timer),
            clock: GameClock::new(),
            config,
            depth: 0,
        }
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Add an entity with its input handler. `None` gives it the base
    /// behavior.
    pub fn spawn(
        &mut self,
        entity: Entity,
        handler: Option<Box<dyn InputHandler>>,
    ) -> Result<EntityId, IoError> {
        let class_name = entity.class_name().to_owned();
        let id = self.entities.insert(entity)?;
        self.handlers
            .insert(id, handler.unwrap_or_else(|| Box::new(BaseEntity)));
        debug!(entity = %id, class = %class_name, "entity spawned");
        Ok(id)
    }

    /// Destroy an entity.
    ///
    /// Deliveries addressed to it are cancelled, its own pending deliveries
    /// are released, and its children are unlinked.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<DestroyedEntity, IoError> {
        let mut destroyed = self.entities.remove(id)?;
        self.handlers.remove(&id);

        for pending in self.scheduler.cancel_to_receiver(id) {
            if let Some(firer) = self.entities.get_mut(pending.delivery.firer) {
                firer.forget_delivery(pending.id);
            }
            debug!(
                delivery = %pending.id,
                receiver = %id,
                input = %pending.delivery.input_name,
                "dangling delivery cancelled"
            );
        }

        for delivery in destroyed.entity.take_pending_deliveries() {
            if let Some(pending) = self.scheduler.cancel(delivery) {
                debug!(
                    delivery = %pending.id,
                    firer = %id,
                    receiver = %pending.delivery.receiver,
                    "firer destroyed, delivery released"
                );
            }
        }

        info!(
            entity = %id,
            class = destroyed.entity.class_name(),
            name = destroyed.entity.target_name().unwrap_or(""),
            "entity destroyed"
        );
        Ok(destroyed)
    }

    // -- Queries ------------------------------------------------------------

    /// The live entity table.
    pub const fn entities(&self) -> &EntityTable {
        &self.entities
    }

    /// Look up a live entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// The game clock.
    pub const fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Current game time.
    pub const fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Dispatch configuration.
    pub const fn config(&self) -> &IoConfig {
        &self.config
    }

    /// The delivery scheduler.
    pub const fn scheduler(&self) -> &DispatchScheduler<T> {
        &self.scheduler
    }

    /// Number of pending deliveries across all entities.
    pub fn pending_deliveries(&self) -> usize {
        self.scheduler.len()
    }

    /// Resolve a target pattern with no firing entity (`!self` names the
    /// caller).
    pub fn resolve_target_name(
        &self,
        pattern: &str,
        caller: Option<EntityId>,
        activator: Option<EntityId>,
    ) -> Vec<EntityId> {
        resolve(&self.entities, pattern, &ResolveContext::new(caller, activator))
    }

    /// `(spawn_flags & flag) != 0` for a live entity; `false` otherwise.
    pub fn has_spawn_flag(&self, id: EntityId, flag: u32) -> bool {
        self.entities.get(id).is_some_and(|entity| entity.has_spawn_flag(flag))
    }

    // -- Firing -------------------------------------------------------------

    /// Fire `input` on `target`. Returns whether the handler handled it.
    ///
    /// Missing receivers and inputs beyond the dispatch depth limit are
    /// dropped and report `false`. Effects requested by the handler are
    /// applied before this returns.
    pub fn fire_input(
        &mut self,
        target: EntityId,
        input: &str,
        args: &[String],
        caller: Option<EntityId>,
        activator: Option<EntityId>,
    ) -> bool {
        let Some(entity) = self.entities.get(target) else {
            debug!(entity = %target, input, "input to destroyed entity dropped");
            return false;
        };
        if self.depth >= self.config.max_dispatch_depth {
            warn!(
                entity = %target,
                input,
                depth = self.depth,
                "dispatch depth limit reached, input dropped"
            );
            return false;
        }

        let event = InputEvent {
            name: input,
            args,
            caller,
            activator,
        };
        let mut effects = InputEffects::new();
        let handled = match self.handlers.get_mut(&target) {
            Some(handler) => handler.on_input_fired(entity, &event, &mut effects),
            None => BaseEntity.on_input_fired(entity, &event, &mut effects),
        };
        trace!(entity = %target, input, handled, "input fired");

        if !effects.is_empty() {
            self.depth = self.depth.saturating_add(1);
            self.apply_effects(target, effects, caller, activator);
            self.depth = self.depth.saturating_sub(1);
        }
        handled
    }

    /// Fire every output of `firer` named `output_name`.
    ///
    /// Returns the number of deliveries dispatched, immediate plus
    /// scheduled, whether or not the receivers handled them. Outputs with no
    /// live target or an exhausted limit are skipped without affecting
    /// their siblings.
    pub fn fire_output(
        &mut self,
        firer: EntityId,
        output_name: &str,
        args: &[String],
        caller: Option<EntityId>,
        activator: Option<EntityId>,
    ) -> usize {
        let Some(entity) = self.entities.get(firer) else {
            debug!(entity = %firer, output = output_name, "output on destroyed entity ignored");
            return 0;
        };
        let output_count = entity.outputs().len();
        let ctx = ResolveContext::for_entity(firer, caller, activator);
        let mut dispatched: usize = 0;

        for index in 0..output_count {
            // A synchronous delivery may have destroyed the firer.
            let Some(output) = self
                .entities
                .get(firer)
                .and_then(|entity| entity.outputs().get(index))
            else {
                break;
            };
            if output.output_name != output_name {
                continue;
            }
            if output.is_exhausted() {
                trace!(
                    entity = %firer,
                    output = output_name,
                    limit = output.fire_limit,
                    "fire limit exhausted, output skipped"
                );
                continue;
            }

            let receivers = resolve(&self.entities, &output.target_pattern, &ctx);
            if receivers.is_empty() {
                if self.config.warn_unresolved_targets {
                    warn!(
                        entity = %firer,
                        output = output_name,
                        target = %output.target_pattern,
                        "output target matched no entity"
                    );
                }
                continue;
            }

            let input_name = output.input_name.clone();
            let delivered_args = output.effective_args(args);
            let delay = output.delay();

            for receiver in receivers {
                // Each receiver costs one fire; a synchronous delivery may
                // also have destroyed the firer or reset its counters.
                let recorded = self
                    .entities
                    .get_mut(firer)
                    .and_then(|entity| entity.output_mut(index))
                    .is_some_and(OutputDefinition::record_fire);
                if !recorded {
                    trace!(
                        entity = %firer,
                        output = output_name,
                        receiver = %receiver,
                        "fire limit reached, remaining targets skipped"
                    );
                    break;
                }

                if delay.is_zero() {
                    self.fire_input(receiver, &input_name, &delivered_args, caller, activator);
                } else {
                    let delivery = Delivery {
                        firer,
                        receiver,
                        input_name: input_name.clone(),
                        args: delivered_args.clone(),
                        caller,
                        activator,
                    };
                    if let Err(e) = self.schedule_delivery(delay, delivery) {
                        warn!(entity = %firer, output = output_name, error = %e, "delivery not scheduled");
                        continue;
                    }
                }
                dispatched = dispatched.saturating_add(1);
            }
        }

        dispatched
    }

    /// Reset every fire counter on `id` and cancel its pending deliveries.
    ///
    /// Returns the number of deliveries cancelled. Calling it again is a
    /// no-op that returns 0.
    pub fn reset_logic_outputs(&mut self, id: EntityId) -> Result<usize, IoError> {
        let entity = self.entities.get_mut(id).ok_or(IoError::EntityNotFound(id))?;
        entity.reset_outputs();
        let pending = entity.take_pending_deliveries();
        let cancelled = pending
            .into_iter()
            .filter(|delivery| self.scheduler.cancel(*delivery).is_some())
            .count();
        debug!(entity = %id, cancelled, "logic outputs reset");
        Ok(cancelled)
    }

    // -- Parenting ----------------------------------------------------------

    /// Re-parent `child` from a `"name[,attachment]"` spec.
    ///
    /// An empty spec clears the parent. An unresolved name leaves the
    /// parent unchanged and is reported as [`Reparent::Unresolved`].
    ///
    /// # Errors
    ///
    /// Returns [`IoError::EntityNotFound`] if `child` is not live, or
    /// [`IoError::World`] wrapping [`WorldError::CyclicParent`] if the
    /// resolved parent would close a cycle. On error the link is unchanged.
    pub fn set_parent(
        &mut self,
        child: EntityId,
        spec: &str,
        caller: Option<EntityId>,
        activator: Option<EntityId>,
    ) -> Result<Reparent, IoError> {
        if !self.entities.contains(child) {
            return Err(IoError::EntityNotFound(child));
        }
        let ctx = ResolveContext::for_entity(child, caller, activator);
        match resolve_parent(&self.entities, spec, &ctx) {
            ParentResolution::Clear => {
                self.entities.set_parent(child, None, None)?;
                debug!(entity = %child, "parent cleared");
                Ok(Reparent::Cleared)
            }
            ParentResolution::Found { parent, attachment } => {
                self.entities
                    .set_parent(child, Some(parent), attachment.clone())?;
                debug!(
                    entity = %child,
                    parent = %parent,
                    attachment = attachment.as_deref().unwrap_or(""),
                    "parent set"
                );
                Ok(Reparent::Attached { parent, attachment })
            }
            ParentResolution::Unresolved { name } => {
                warn!(entity = %child, parent = %name, "parent name matched no entity");
                Ok(Reparent::Unresolved { name })
            }
        }
    }

    // -- Time ---------------------------------------------------------------

    /// Advance game time by `elapsed` and deliver every fire that comes due.
    ///
    /// The clock steps to each delivery's deadline before it runs, so fires
    /// scheduled from a delivery are measured from that moment and may
    /// themselves come due within the same tick.
    pub fn advance(&mut self, elapsed: Duration) -> Result<TickSummary, IoError> {
        let end = self.clock.deadline_after(elapsed)?;
        let mut delivered: usize = 0;

        while let Some(pending) = self.scheduler.pop_due(end) {
            self.clock.step_to(pending.deadline);
            let Delivery {
                firer,
                receiver,
                input_name,
                args,
                caller,
                activator,
            } = pending.delivery;
            if let Some(entity) = self.entities.get_mut(firer) {
                entity.forget_delivery(pending.id);
            }
            if self.entities.contains(receiver) {
                self.fire_input(receiver, &input_name, &args, caller, activator);
                delivered = delivered.saturating_add(1);
            } else {
                debug!(delivery = %pending.id, receiver = %receiver, "dangling delivery dropped");
            }
        }

        let tick = self.clock.complete_tick(end)?;
        Ok(TickSummary {
            tick,
            now: self.clock.now(),
            delivered,
            pending: self.scheduler.len(),
        })
    }

    // -- Internal -----------------------------------------------------------

    fn schedule_delivery(
        &mut self,
        delay: Duration,
        delivery: Delivery,
    ) -> Result<DeliveryId, IoError> {
        let deadline = self.clock.deadline_after(delay)?;
        let firer = delivery.firer;
        let id = self.scheduler.schedule(deadline, delivery);
        if let Some(entity) = self.entities.get_mut(firer) {
            entity.track_delivery(id);
        }
        Ok(id)
    }

    fn apply_effects(
        &mut self,
        target: EntityId,
        effects: InputEffects,
        caller: Option<EntityId>,
        activator: Option<EntityId>,
    ) {
        for effect in effects.into_vec() {
            if !self.entities.contains(target) {
                break;
            }
            match effect {
                InputEffect::FireOutput { name, args } => {
                    self.fire_output(target, &name, &args, Some(target), activator);
                }
                InputEffect::Destroy => {
                    if let Err(e) = self.destroy_entity(target) {
                        warn!(entity = %target, error = %e, "destroy failed");
                    }
                }
                InputEffect::SetParent(spec) => {
                    if let Err(e) = self.set_parent(target, &spec, caller, activator) {
                        warn!(entity = %target, spec = %spec, error = %e, "re-parent rejected");
                    }
                }
                InputEffect::ClearParent => {
                    if let Err(e) = self.set_parent(target, "", caller, activator) {
                        warn!(entity = %target, error = %e, "clear parent failed");
                    }
                }
                InputEffect::AddOutput(output) => {
                    if let Some(entity) = self.entities.get_mut(target) {
                        debug!(
                            entity = %target,
                            output = %output.output_name,
                            target = %output.target_pattern,
                            input = %output.input_name,
                            "output added"
                        );
                        entity.add_output(output);
                    }
                }
            }
        }
    }
}

impl<T: TimerService> fmt::Debug for IoSystem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoSystem")
            .field("entities", &self.entities.len())
            .field("pending", &self.scheduler.len())
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
