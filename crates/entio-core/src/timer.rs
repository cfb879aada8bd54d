//! One-shot timer service abstraction and the default deadline queue.
//!
//! The host's timer collaborator is modeled as [`TimerService`]: schedule a
//! token for an absolute deadline, cancel it by handle, and poll for tokens
//! whose deadline has passed.
//!
//! [`DeadlineQueue`] is a min-heap keyed by `(deadline, sequence)`.
//! Cancellation is lazy: the handle is dropped from the live set and the
//! heap entry becomes a tombstone that [`TimerService::pop_due`] skips.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use std::time::Duration;

use entio_types::DeliveryId;

/// Handle to one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// The raw sequence number.
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// The host timer collaborator.
pub trait TimerService {
    /// Schedule `token` to become due at absolute game time `deadline`.
    fn schedule_once(&mut self, deadline: Duration, token: DeliveryId) -> TimerHandle;

    /// Cancel a timer. Returns `true` if it was still pending.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Remove and return the earliest timer due at or before `now`.
    ///
    /// Timers with equal deadlines come out in scheduling order.
    fn pop_due(&mut self, now: Duration) -> Option<(Duration, DeliveryId)>;

    /// Number of live (scheduled, not cancelled, not popped) timers.
    fn pending(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    deadline: Duration,
    handle: TimerHandle,
    token: DeliveryId,
}

/// Binary-heap timer queue with tombstoned cancellation.
#[derive(Debug, Clone, Default)]
pub struct DeadlineQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    live: BTreeSet<TimerHandle>,
    next_sequence: u64,
}

impl DeadlineQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: BTreeSet::new(),
            next_sequence: 0,
        }
    }

    /// Deadline of the earliest live timer, if any.
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.discard_tombstones();
        self.heap.peek().map(|Reverse(entry)| entry.deadline)
    }

    fn discard_tombstones(&mut self) {
        while let Some(Reverse(entry)) = self.heap.peek() {
            if self.live.contains(&entry.handle) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl TimerService for DeadlineQueue {
    fn schedule_once(&mut self, deadline: Duration, token: DeliveryId) -> TimerHandle {
        let handle = TimerHandle(self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.live.insert(handle);
        self.heap.push(Reverse(Entry {
            deadline,
            handle,
            token,
        }));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.live.remove(&handle)
    }

    fn pop_due(&mut self, now: Duration) -> Option<(Duration, DeliveryId)> {
        self.discard_tombstones();
        let due = self
            .heap
            .peek()
            .is_some_and(|Reverse(entry)| entry.deadline <= now);
        if !due {
            return None;
        }
        let Reverse(entry) = self.heap.pop()?;
        self.live.remove(&entry.handle);
        Some((entry.deadline, entry.token))
    }

    fn pending(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut queue = DeadlineQueue::new();
        let late = DeliveryId::new();
        let early = DeliveryId::new();
        queue.schedule_once(secs(5), late);
        queue.schedule_once(secs(2), early);

        assert_eq!(queue.pop_due(secs(1)), None);
        assert_eq!(queue.pop_due(secs(10)), Some((secs(2), early)));
        assert_eq!(queue.pop_due(secs(10)), Some((secs(5), late)));
        assert_eq!(queue.pop_due(secs(10)), None);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn equal_deadlines_are_fifo() {
        let mut queue = DeadlineQueue::new();
        let tokens: Vec<DeliveryId> = (0..4).map(|_| DeliveryId::new()).collect();
        for token in &tokens {
            queue.schedule_once(secs(1), *token);
        }
        let popped: Vec<DeliveryId> = std::iter::from_fn(|| queue.pop_due(secs(1)))
            .map(|(_, token)| token)
            .collect();
        assert_eq!(popped, tokens);
    }

    #[test]
    fn cancelled_timers_are_skipped() {
        let mut queue = DeadlineQueue::new();
        let cancelled = DeliveryId::new();
        let kept = DeliveryId::new();
        let handle = queue.schedule_once(secs(1), cancelled);
        queue.schedule_once(secs(2), kept);

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.next_deadline(), Some(secs(2)));
        assert_eq!(queue.pop_due(secs(3)), Some((secs(2), kept)));
    }

    #[test]
    fn popped_timer_cannot_be_cancelled() {
        let mut queue = DeadlineQueue::new();
        let handle = queue.schedule_once(secs(1), DeliveryId::new());
        assert!(queue.pop_due(secs(1)).is_some());
        assert!(!queue.cancel(handle));
    }
}
