//! Receiving side of the bus.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::events::{BridgeEvent, EventFilter};
use crate::publisher::DeliveryCounters;

/// Subscription failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// Filtered view of the bus. Dropping it unsubscribes.
pub struct Subscription {
    receiver: broadcast::Receiver<BridgeEvent>,
    filter: EventFilter,
    counters: Arc<DeliveryCounters>,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<BridgeEvent>,
        filter: EventFilter,
        counters: Arc<DeliveryCounters>,
    ) -> Self {
        Self {
            receiver,
            filter,
            counters,
        }
    }

    /// Next matching event, or `None` once the bus is gone.
    ///
    /// Events skipped because this subscriber fell behind are counted in
    /// [`BusStats::lagged`](crate::BusStats::lagged) and otherwise ignored.
    pub async fn recv(&mut self) -> Option<BridgeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Result<Option<BridgeEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Every matching event currently queued.
    pub fn drain(&mut self) -> Vec<BridgeEvent> {
        std::iter::from_fn(|| self.try_recv().ok().flatten()).collect()
    }

    fn lagged(&self, skipped: u64) {
        warn!(skipped, "Event subscriber fell behind");
        self.counters.record_lag(skipped);
    }
}
