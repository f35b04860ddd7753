//! Publishing side of the bus and its delivery counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::events::{BridgeEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Sink for subsystem notifications.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event`, returning how many subscribers it reached.
    async fn publish(&self, event: BridgeEvent) -> usize;
}

/// Delivery counters of an [`InMemoryEventBus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Events handed to the bus.
    pub published: u64,
    /// Of those, events flagged as warnings.
    pub warnings: u64,
    /// Events published while nobody was subscribed.
    pub undelivered: u64,
    /// Events a slow subscriber skipped because its queue overflowed.
    pub lagged: u64,
    /// Live subscriptions.
    pub subscribers: usize,
}

/// Shared with every [`Subscription`] so lag is counted where it happens.
#[derive(Debug, Default)]
pub(crate) struct DeliveryCounters {
    published: AtomicU64,
    warnings: AtomicU64,
    undelivered: AtomicU64,
    lagged: AtomicU64,
}

impl DeliveryCounters {
    pub(crate) fn record_lag(&self, skipped: u64) {
        self.lagged.fetch_add(skipped, Ordering::Relaxed);
    }
}

/// Broadcast bus over `tokio::sync::broadcast`.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<BridgeEvent>,
    counters: Arc<DeliveryCounters>,
}

impl InMemoryEventBus {
    /// Bus buffering [`DEFAULT_CHANNEL_CAPACITY`] events per subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            counters: Arc::new(DeliveryCounters::default()),
        }
    }

    /// Receive every later event that passes `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, warnings_only = filter.warnings_only, "Subscribed");
        Subscription::new(self.sender.subscribe(), filter, self.counters.clone())
    }

    /// Current counters.
    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.counters.published.load(Ordering::Relaxed),
            warnings: self.counters.warnings.load(Ordering::Relaxed),
            undelivered: self.counters.undelivered.load(Ordering::Relaxed),
            lagged: self.counters.lagged.load(Ordering::Relaxed),
            subscribers: self.sender.receiver_count(),
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: BridgeEvent) -> usize {
        let topic = event.topic();
        self.counters.published.fetch_add(1, Ordering::Relaxed);
        if event.is_warning() {
            self.counters.warnings.fetch_add(1, Ordering::Relaxed);
        }

        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(topic = ?topic, receivers, "Event published");
                receivers
            }
            Err(_) => {
                self.counters.undelivered.fetch_add(1, Ordering::Relaxed);
                0
            }
        }
    }
}

/// Discards everything. For components built without a bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, _event: BridgeEvent) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;

    fn reorg_halt() -> BridgeEvent {
        BridgeEvent::EmergencyHalt {
            depth: 150,
            reason: "reorg".into(),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_undelivered() {
        let bus = InMemoryEventBus::new();
        assert_eq!(bus.publish(BridgeEvent::HaltCleared).await, 0);

        let stats = bus.stats();
        assert_eq!(stats.published, 1);
        assert_eq!(stats.undelivered, 1);
        assert_eq!(stats.subscribers, 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = InMemoryEventBus::new();
        let _all = bus.subscribe(EventFilter::all());
        let _warnings = bus.subscribe(EventFilter::warnings());
        let _submission = bus.subscribe(EventFilter::topics(vec![EventTopic::Submission]));

        // Filtering happens on receive, so every receiver counts.
        assert_eq!(bus.publish(BridgeEvent::HaltCleared).await, 3);
        assert_eq!(bus.stats().subscribers, 3);
        assert_eq!(bus.stats().undelivered, 0);
    }

    #[tokio::test]
    async fn test_warnings_counted() {
        let bus = InMemoryEventBus::new();
        bus.publish(reorg_halt()).await;
        bus.publish(BridgeEvent::HaltCleared).await;
        assert_eq!(bus.stats().warnings, 1);
        assert_eq!(bus.stats().published, 2);
    }

    #[tokio::test]
    async fn test_noop_publisher_reaches_nobody() {
        assert_eq!(NoopEventPublisher.publish(reorg_halt()).await, 0);
    }
}
