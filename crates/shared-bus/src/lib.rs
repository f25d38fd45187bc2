//! # Shared Bus - Per-Key Event Broadcast
//!
//! Fans out live events to every observer subscribed to a key. In the
//! attendance runtime the key is a course and the observers are the
//! dashboards watching that course's session.
//!
//! ```text
//! ┌──────────────┐    publish(key, event)    ┌──────────────┐
//! │   Session    │ ─────────────────────────→│  Event Bus   │
//! │   Engine     │                           │  key → chan  │
//! └──────────────┘                           └──────┬───────┘
//!                                                   │ subscribe(key)
//!                                     ┌─────────────┼─────────────┐
//!                                     ↓             ↓             ↓
//!                                 dashboard     dashboard     dashboard
//! ```
//!
//! ## Delivery Semantics
//!
//! - **Best-effort**: an observer that lags past the channel capacity skips
//!   the overwritten events and keeps receiving.
//! - **No replay**: a subscriber only sees events published after it
//!   subscribed. Observers resync by querying authoritative state.
//! - **Isolation**: keys never share a channel.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::BusEvent;
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Events buffered per key before slow observers start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
