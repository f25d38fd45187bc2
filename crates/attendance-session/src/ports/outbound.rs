//! Outbound (Driven) ports for the attendance session engine.
//!
//! These traits define the external collaborators the engine depends on.

use crate::domain::{AttendanceRecord, SessionEvent};
use crate::error::{DirectoryError, LedgerError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_bus::EventPublisher;
use shared_types::{CourseId, CourseRecord, SessionDate, UserId};

/// Outcome of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same (course, student, session date) exists.
    AlreadyExists,
}

/// Durable attendance store.
///
/// Implementations must make `insert_if_absent` atomic on the
/// (course, student, session date) key even under concurrent writers; this
/// is the invariant that survives a process crash.
#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    /// Insert `record` unless its key is already present.
    async fn insert_if_absent(&self, record: AttendanceRecord)
        -> Result<InsertOutcome, LedgerError>;

    /// Records of one course on one day, in insertion order.
    async fn records_for_session(
        &self,
        course_id: &CourseId,
        session_date: SessionDate,
    ) -> Result<Vec<AttendanceRecord>, LedgerError>;

    /// Every record of a student, newest first.
    async fn history_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<AttendanceRecord>, LedgerError>;
}

/// Read access to the course store.
#[async_trait]
pub trait CourseDirectory: Send + Sync {
    /// Look up a course. `Ok(None)` means the course does not exist.
    async fn find_course(&self, course_id: &CourseId) -> Result<Option<CourseRecord>, DirectoryError>;
}

/// Wall-clock source.
///
/// Abstracted so tests can drive time deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Sink for live dashboard events, keyed by course.
pub type SessionEventPublisher = dyn EventPublisher<CourseId, SessionEvent>;
