//! Course-keyed event bus for live dashboards.

use crate::config::SessionConfig;
use crate::domain::SessionEvent;
use shared_bus::InMemoryEventBus;
use shared_types::CourseId;
use std::sync::Arc;

/// The bus carrying session events, keyed by course.
pub type SessionBus = InMemoryEventBus<CourseId, SessionEvent>;

/// Create a bus sized by `config.event_buffer`.
pub fn session_bus(config: &SessionConfig) -> Arc<SessionBus> {
    Arc::new(SessionBus::with_capacity(config.event_buffer))
}
