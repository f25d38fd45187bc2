//! # Event Publisher
//!
//! Defines the publishing side of the bus.

use crate::events::BusEvent;
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Trait for publishing events to the observers of a key.
#[async_trait]
pub trait EventPublisher<K, E>: Send + Sync
where
    K: Send + Sync + 'static,
    E: BusEvent,
{
    /// Publish an event to every current subscriber of `key`.
    ///
    /// # Returns
    ///
    /// The number of subscribers that received the event.
    async fn publish(&self, key: &K, event: E) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the bus.
///
/// One `tokio::sync::broadcast` channel per key, created on first
/// subscription and pruned once its last subscriber is gone. Suitable for a
/// single process; sharing sessions across processes would need a different
/// implementation (e.g. Redis pub/sub).
pub struct InMemoryEventBus<K, E>
where
    K: Eq + Hash,
{
    /// Broadcast sender per key.
    channels: DashMap<K, broadcast::Sender<E>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Per-key channel capacity.
    capacity: usize,
}

impl<K, E> InMemoryEventBus<K, E>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    E: BusEvent,
{
    /// Create a new bus with default per-key capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with the given per-key capacity.
    ///
    /// A zero capacity is raised to one, `broadcast::channel` rejects zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to the events of `key`.
    #[must_use]
    pub fn subscribe(&self, key: &K) -> Subscription<E> {
        let receiver = self
            .channels
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        debug!(key = ?key, "New subscription created");

        Subscription::new(receiver, format!("{key:?}"))
    }

    /// Get a stream of the events of `key`.
    #[must_use]
    pub fn event_stream(&self, key: &K) -> EventStream<E> {
        self.subscribe(key).into_stream()
    }

    /// Number of live subscribers for `key`.
    #[must_use]
    pub fn subscriber_count(&self, key: &K) -> usize {
        self.channels
            .get(key)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Number of keys that currently hold a channel.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.channels.len()
    }

    /// Get the per-key channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop the channels of every key without subscribers.
    pub fn prune_idle(&self) {
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl<K, E> Default for InMemoryEventBus<K, E>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    E: BusEvent,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, E> EventPublisher<K, E> for InMemoryEventBus<K, E>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    E: BusEvent,
{
    async fn publish(&self, key: &K, event: E) -> usize {
        let kind = event.kind();

        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let sent = match self.channels.get(key) {
            Some(sender) => sender.send(event).ok(),
            None => None,
        };

        match sent {
            Some(receivers) => {
                debug!(key = ?key, kind, receivers, "Event published");
                receivers
            }
            None => {
                // The shard lock held by remove_if keeps a concurrent
                // subscribe from landing on a channel that is being dropped.
                self.channels
                    .remove_if(key, |_, sender| sender.receiver_count() == 0);
                debug!(key = ?key, kind, "Event dropped (no subscribers)");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::Ping;

    type Bus = InMemoryEventBus<String, Ping>;

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[tokio::test]
    async fn test_publish_no_subscribers() {
        let bus = Bus::new();

        let receivers = bus.publish(&key("c1"), Ping::Seq(1)).await;
        assert_eq!(receivers, 0);
        assert_eq!(bus.events_published(), 1);
        assert_eq!(bus.key_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_with_subscriber() {
        let bus = Bus::new();

        // Create subscriber BEFORE publishing
        let _sub = bus.subscribe(&key("c1"));

        let receivers = bus.publish(&key("c1"), Ping::Seq(1)).await;

        assert_eq!(receivers, 1);
        assert_eq!(bus.subscriber_count(&key("c1")), 1);
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let bus = Bus::new();

        let _a1 = bus.subscribe(&key("a"));
        let _a2 = bus.subscribe(&key("a"));
        let _b = bus.subscribe(&key("b"));

        assert_eq!(bus.publish(&key("a"), Ping::Seq(1)).await, 2);
        assert_eq!(bus.publish(&key("b"), Ping::Seq(1)).await, 1);
        assert_eq!(bus.publish(&key("c"), Ping::Seq(1)).await, 0);
        assert_eq!(bus.key_count(), 2);
    }

    #[tokio::test]
    async fn test_channel_pruned_after_last_subscriber_leaves() {
        let bus = Bus::new();

        {
            let _sub = bus.subscribe(&key("c1"));
            assert_eq!(bus.key_count(), 1);
        }

        assert_eq!(bus.subscriber_count(&key("c1")), 0);
        assert_eq!(bus.publish(&key("c1"), Ping::Stop).await, 0);
        assert_eq!(bus.key_count(), 0);
    }

    #[tokio::test]
    async fn test_prune_idle_keeps_live_keys() {
        let bus = Bus::new();
        let _live = bus.subscribe(&key("live"));
        drop(bus.subscribe(&key("idle")));

        bus.prune_idle();

        assert_eq!(bus.key_count(), 1);
        assert_eq!(bus.subscriber_count(&key("live")), 1);
    }

    #[test]
    fn test_custom_capacity() {
        assert_eq!(Bus::with_capacity(100).capacity(), 100);
        assert_eq!(Bus::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn test_default_bus() {
        let bus = Bus::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.key_count(), 0);
        assert_eq!(bus.events_published(), 0);
    }
}
