//! Shared fixtures for the integration flows.

use attendance_session::adapters::{
    session_bus, InMemoryCourseDirectory, InMemoryLedger, MonotonicClock, SessionBus,
};
use attendance_session::domain::TokenGenerator;
use attendance_session::{
    AttendanceService, RedeemRequest, SessionConfig, SessionEvent, SessionToken,
};
use chrono::{DateTime, TimeZone, Utc};
use shared_bus::Subscription;
use shared_types::{Caller, CourseId, CourseRecord, GeoPoint, UserId};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Classroom of every fixture course.
pub const CLASSROOM: GeoPoint = GeoPoint::new(26.9124, 75.7873);
/// About 55 m north of [`CLASSROOM`].
pub const NEAR_CLASSROOM: GeoPoint = GeoPoint::new(26.9129, 75.7873);
/// About 1.1 km north of [`CLASSROOM`].
pub const ACROSS_TOWN: GeoPoint = GeoPoint::new(26.9224, 75.7873);

/// Tokens "t1", "t2", ... in issue order.
#[derive(Debug, Default)]
pub struct SequentialTokens(AtomicU32);

impl TokenGenerator for SequentialTokens {
    fn generate(&self) -> SessionToken {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        SessionToken::new(format!("t{n}"))
    }
}

/// A wired engine with handles on its adapters.
pub struct Classroom {
    pub service: AttendanceService,
    pub bus: Arc<SessionBus>,
    pub ledger: Arc<InMemoryLedger>,
    pub directory: Arc<InMemoryCourseDirectory>,
}

/// 09:00 UTC on a weekday.
pub fn class_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap()
}

pub fn course(id: &str, faculty: &str, students: &[&str]) -> CourseRecord {
    CourseRecord {
        id: CourseId::new(id),
        name: format!("Course {id}"),
        faculty: UserId::new(faculty),
        students: students.iter().map(|s| UserId::new(*s)).collect(),
        classroom: CLASSROOM,
    }
}

/// Deterministic engine: sequential tokens and a clock anchored at
/// [`class_start`] that follows tokio's (possibly paused) time.
pub fn classroom(config: SessionConfig, courses: Vec<CourseRecord>) -> Classroom {
    let directory: Arc<InMemoryCourseDirectory> = Arc::new(courses.into_iter().collect());
    let ledger = Arc::new(InMemoryLedger::new());
    let bus = session_bus(&config);

    let service = AttendanceService::builder(config, directory.clone(), ledger.clone(), bus.clone())
        .clock(Arc::new(MonotonicClock::starting_at(class_start())))
        .token_generator(Arc::new(SequentialTokens::default()))
        .build()
        .unwrap();

    Classroom {
        service,
        bus,
        ledger,
        directory,
    }
}

/// Engine with the default OS token generator and wall clock.
pub fn live_classroom(config: SessionConfig, courses: Vec<CourseRecord>) -> Classroom {
    let directory: Arc<InMemoryCourseDirectory> = Arc::new(courses.into_iter().collect());
    let ledger = Arc::new(InMemoryLedger::new());
    let bus = session_bus(&config);
    let service =
        AttendanceService::new(config, directory.clone(), ledger.clone(), bus.clone()).unwrap();

    Classroom {
        service,
        bus,
        ledger,
        directory,
    }
}

pub fn faculty(id: &str) -> Caller {
    Caller::faculty(id)
}

pub fn student(id: &str) -> Caller {
    Caller::student(id).with_display(format!("Student {id}"), format!("{id}@example.edu"))
}

pub fn redeem(course: &str, token: &str, location: Option<GeoPoint>) -> RedeemRequest {
    RedeemRequest {
        course_id: CourseId::new(course),
        token: token.to_string(),
        location,
    }
}

/// Everything buffered on `sub` right now.
pub fn drain(sub: &mut Subscription<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = sub.try_recv() {
        events.push(event);
    }
    events
}

pub async fn advance_secs(secs: u64) {
    tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
}
