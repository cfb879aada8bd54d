//! Delayed delivery scheduling.
//!
//! [`DispatchScheduler`] owns every [`PendingDelivery`] and the timer
//! service that wakes them. The receiver of a delivery is fixed when it is
//! scheduled: target patterns are resolved at fire time, never re-resolved
//! at delivery time.
//!
//! A delivery leaves the scheduler exactly once, either popped as due or
//! cancelled. Its handle is a [`DeliveryId`]; the timer handle underneath
//! stays private.

use std::collections::BTreeMap;
use std::time::Duration;

use entio_types::{DeliveryId, EntityId};
use tracing::debug;

use crate::timer::{DeadlineQueue, TimerHandle, TimerService};

/// An input fire addressed to one resolved receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The entity whose output produced this delivery.
    pub firer: EntityId,
    /// The receiver, resolved at fire time.
    pub receiver: EntityId,
    /// Input to fire on the receiver.
    pub input_name: String,
    /// Arguments after parameter substitution.
    pub args: Vec<String>,
    /// Caller passed to the receiver.
    pub caller: Option<EntityId>,
    /// Activator passed to the receiver.
    pub activator: Option<EntityId>,
}

/// A scheduled, not-yet-delivered input fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelivery {
    /// Cancellation handle.
    pub id: DeliveryId,
    /// Absolute game time the delivery becomes due.
    pub deadline: Duration,
    /// What to deliver.
    pub delivery: Delivery,
    timer: TimerHandle,
}

/// Owns pending deliveries and the timer service that wakes them.
#[derive(Debug, Clone, Default)]
pub struct DispatchScheduler<T = DeadlineQueue> {
    timer: T,
    pending: BTreeMap<DeliveryId, PendingDelivery>,
}

impl<T: TimerService> DispatchScheduler<T> {
    /// Create a scheduler over a timer service.
    pub const fn new(timer: T) -> Self {
        Self {
            timer,
            pending: BTreeMap::new(),
        }
    }

    /// Schedule `delivery` for absolute game time `deadline`.
    pub fn schedule(&mut self, deadline: Duration, delivery: Delivery) -> DeliveryId {
        let id = DeliveryId::new();
        let timer = self.timer.schedule_once(deadline, id);
        debug!(
            delivery = %id,
            receiver = %delivery.receiver,
            input = %delivery.input_name,
            deadline_ms = deadline.as_millis(),
            "delivery scheduled"
        );
        self.pending.insert(
            id,
            PendingDelivery {
                id,
                deadline,
                delivery,
                timer,
            },
        );
        id
    }

    /// Cancel one delivery. Returns it if it was still pending.
    pub fn cancel(&mut self, id: DeliveryId) -> Option<PendingDelivery> {
        let pending = self.pending.remove(&id)?;
        self.timer.cancel(pending.timer);
        Some(pending)
    }

    /// Cancel every delivery addressed to `receiver`.
    pub fn cancel_to_receiver(&mut self, receiver: EntityId) -> Vec<PendingDelivery> {
        let ids: Vec<DeliveryId> = self
            .pending
            .values()
            .filter(|pending| pending.delivery.receiver == receiver)
            .map(|pending| pending.id)
            .collect();
        ids.into_iter().filter_map(|id| self.cancel(id)).collect()
    }

    /// Remove and return the earliest delivery due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<PendingDelivery> {
        while let Some((_, id)) = self.timer.pop_due(now) {
            if let Some(pending) = self.pending.remove(&id) {
                return Some(pending);
            }
        }
        None
    }

    /// Look up a pending delivery.
    pub fn get(&self, id: DeliveryId) -> Option<&PendingDelivery> {
        self.pending.get(&id)
    }

    /// `true` if the delivery is still pending.
    pub fn is_pending(&self, id: DeliveryId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of pending deliveries.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterate pending deliveries (ordered by handle, not deadline).
    pub fn iter(&self) -> impl Iterator<Item = &PendingDelivery> {
        self.pending.values()
    }

    /// The underlying timer service.
    pub const fn timer(&self) -> &T {
        &self.timer
    }
}
