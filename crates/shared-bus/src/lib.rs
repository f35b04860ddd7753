//! # Shared Bus - Bridge Event Bus
//!
//! Every subsystem reports what it did through a broadcast bus. Nothing on
//! the bus drives control flow: the orchestrator owns the pipeline and the
//! bus only carries notifications for operators, audit and tests.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Orchestrator │                    │  Dashboard   │
//! │              │    publish()       │  / auditor   │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{BridgeEvent, EventFilter, EventTopic, SinkKind};
pub use publisher::{BusStats, EventPublisher, InMemoryEventBus, NoopEventPublisher};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
