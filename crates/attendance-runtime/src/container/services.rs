//! # Service Container
//!
//! Holds the session engine and the adapters it is wired to.
//!
//! ```text
//! InMemoryCourseDirectory ──┐
//! InMemoryLedger ───────────┼──→ AttendanceService ──publish──→ SessionBus ──→ dashboards
//! MonotonicClock ───────────┘
//! ```

use super::config::{ConfigError, RuntimeConfig};
use super::courses::load_courses;
use attendance_session::adapters::{
    session_bus, InMemoryCourseDirectory, InMemoryLedger, SessionBus,
};
use attendance_session::AttendanceService;
use std::sync::Arc;
use tracing::{info, warn};

/// All long-lived runtime components.
pub struct ServiceContainer {
    pub service: AttendanceService,
    pub bus: Arc<SessionBus>,
    pub ledger: Arc<InMemoryLedger>,
    pub directory: Arc<InMemoryCourseDirectory>,
}

impl ServiceContainer {
    /// Wire the engine, seeding the directory from `courses_file` if set.
    pub fn new(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let directory = Arc::new(InMemoryCourseDirectory::new());
        match &config.courses_file {
            Some(path) => {
                for course in load_courses(path)? {
                    directory.upsert(course);
                }
                info!(courses = directory.len(), path = %path.display(), "Course directory seeded");
            }
            None => warn!("No courses file configured; course directory is empty"),
        }

        Self::with_directory(config, directory)
    }

    /// Wire the engine around an existing directory.
    pub fn with_directory(
        config: &RuntimeConfig,
        directory: Arc<InMemoryCourseDirectory>,
    ) -> Result<Self, ConfigError> {
        let bus = session_bus(&config.session);
        let ledger = Arc::new(InMemoryLedger::new());

        let service = AttendanceService::new(
            config.session.clone(),
            directory.clone(),
            ledger.clone(),
            bus.clone(),
        )?;

        Ok(Self {
            service,
            bus,
            ledger,
            directory,
        })
    }
}
