// src/stats/broadcaster.rs
//! Fan-out of the supervisor state to any number of observers.
//!
//! [`StateBroadcaster`] keeps the latest [`Snapshot`] and one unbounded FIFO
//! queue per [`Subscription`]:
//!
//! - A new subscription is seeded with the current snapshot, so it never
//!   starts empty.
//! - [`StateBroadcaster::publish`] pushes to every live queue without blocking.
//! - Each subscriber sees snapshots in publish order; there is no ordering
//!   between different subscribers.
//! - Dropping a subscription unregisters it; nobody else is affected.

use crate::stats::aggregator::MiningStats;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;

/// Point-in-time view of the supervisor handed to observers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Whether a worker process is currently running
    pub running: bool,
    /// Statistics of the current run (zero when not running)
    pub stats: MiningStats,
}

struct Registry {
    latest: Snapshot,
    observers: HashMap<u64, mpsc::UnboundedSender<Snapshot>>,
    next_id: u64,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publishes the latest [`Snapshot`] to every registered observer
///
/// Cloning is cheap and every clone shares the same observers.
#[derive(Clone)]
pub struct StateBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl Default for StateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBroadcaster {
    /// Creates a broadcaster whose current value is the idle, zeroed snapshot
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                latest: Snapshot::default(),
                observers: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Replaces the current value and delivers it to every observer
    ///
    /// Queues whose subscription is gone are pruned.
    pub fn publish(&self, snapshot: Snapshot) {
        let mut registry = lock(&self.registry);
        registry
            .observers
            .retain(|_, tx| tx.send(snapshot.clone()).is_ok());
        registry.latest = snapshot;
    }

    /// Registers a new observer
    ///
    /// The returned subscription already holds the current snapshot.
    ///
    /// Its queue is unbounded and receives every published snapshot, roughly
    /// one per telemetry line plus one per tick. A registered subscription
    /// that is never read keeps growing; observers that only render the
    /// current state should call [`Subscription::latest`] to drain it, and
    /// idle ones should be dropped.
    pub fn subscribe(&self) -> Subscription {
        let mut registry = lock(&self.registry);
        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(registry.latest.clone());

        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.insert(id, tx);

        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// The most recently published snapshot
    pub fn latest(&self) -> Snapshot {
        lock(&self.registry).latest.clone()
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        lock(&self.registry).observers.len()
    }
}

/// Receiving end of one observer registration
///
/// Dropping it (or calling [`Subscription::unsubscribe`]) stops delivery.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Snapshot>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Waits for the next snapshot
    ///
    /// Returns `None` once the broadcaster is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Next queued snapshot, if any, without waiting
    pub fn try_recv(&mut self) -> Option<Snapshot> {
        self.rx.try_recv().ok()
    }

    /// Drains the queue and returns only the newest snapshot
    ///
    /// For observers that render state and do not care about history.
    pub fn latest(&mut self) -> Option<Snapshot> {
        let mut newest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            newest = Some(snapshot);
        }
        newest
    }

    /// Unregisters this observer
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).observers.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_with_accepted(accepted: u64) -> Snapshot {
        Snapshot {
            running: true,
            stats: MiningStats {
                accepted_shares: accepted,
                ..MiningStats::default()
            },
        }
    }

    #[test]
    fn test_new_subscriber_gets_current_value() {
        let broadcaster = StateBroadcaster::new();
        let mut first = broadcaster.subscribe();
        assert_eq!(first.try_recv(), Some(Snapshot::default()));

        broadcaster.publish(running_with_accepted(2));
        let mut late = broadcaster.subscribe();
        assert_eq!(late.try_recv(), Some(running_with_accepted(2)));
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn test_updates_arrive_in_order_for_each_observer() {
        let broadcaster = StateBroadcaster::new();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        for n in 1..=3 {
            broadcaster.publish(running_with_accepted(n));
        }

        for sub in [&mut a, &mut b] {
            assert_eq!(sub.try_recv(), Some(Snapshot::default()));
            for n in 1..=3 {
                assert_eq!(sub.try_recv(), Some(running_with_accepted(n)));
            }
            assert_eq!(sub.try_recv(), None);
        }
    }

    #[test]
    fn test_unsubscribe_only_affects_that_observer() {
        let broadcaster = StateBroadcaster::new();
        let a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        assert_eq!(broadcaster.observer_count(), 2);

        a.unsubscribe();
        assert_eq!(broadcaster.observer_count(), 1);

        broadcaster.publish(running_with_accepted(1));
        assert_eq!(b.latest(), Some(running_with_accepted(1)));
        assert_eq!(broadcaster.latest(), running_with_accepted(1));
    }

    #[test]
    fn test_latest_drains_backlog() {
        let broadcaster = StateBroadcaster::new();
        let mut sub = broadcaster.subscribe();
        for n in 1..=100 {
            broadcaster.publish(running_with_accepted(n));
        }

        assert_eq!(sub.latest(), Some(running_with_accepted(100)));
        assert_eq!(sub.try_recv(), None);
        assert_eq!(sub.latest(), None);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let json = serde_json::to_value(running_with_accepted(3)).unwrap();
        assert_eq!(json["running"], true);
        assert_eq!(json["stats"]["accepted_shares"], 3);
        assert_eq!(json["stats"]["hashrate"], 0.0);
        assert!(json["stats"]["temperature"].is_null());
    }

    #[tokio::test]
    async fn test_recv_waits_for_publish() {
        let broadcaster = StateBroadcaster::new();
        let mut sub = broadcaster.subscribe();
        assert_eq!(sub.recv().await, Some(Snapshot::default()));

        let publisher = broadcaster.clone();
        tokio::spawn(async move { publisher.publish(running_with_accepted(7)) });

        assert_eq!(sub.recv().await, Some(running_with_accepted(7)));
    }
}
