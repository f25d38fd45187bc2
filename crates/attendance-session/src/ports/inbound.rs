//! # Inbound Ports (Driving Ports)
//!
//! The API the gateway drives. Every operation takes the authenticated
//! `Caller`; role and ownership checks happen behind this trait.

use crate::domain::{AttendanceRecord, SessionSnapshot, SessionToken};
use crate::error::SessionResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Caller, CourseId, GeoPoint, SessionDate};

/// Returned to the faculty that opened a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStarted {
    pub course_id: CourseId,
    pub token: SessionToken,
    pub expires_at: DateTime<Utc>,
    pub session_date: SessionDate,
    pub rotation: u32,
}

/// A student's redemption request.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RedeemRequest {
    pub course_id: CourseId,
    pub token: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// Confirmation shown to a credited student.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RedeemReceipt {
    pub course_id: CourseId,
    pub session_date: SessionDate,
    pub timestamp: DateTime<Utc>,
    /// Distance to the classroom when geofencing applied.
    pub distance_m: Option<u32>,
}

/// Liveness view used by observers to resync.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStatus {
    pub course_id: CourseId,
    pub active: bool,
    pub session_date: Option<SessionDate>,
}

/// Ledger records of one course on one day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub course_id: CourseId,
    pub session_date: SessionDate,
    pub records: Vec<AttendanceRecord>,
}

/// Primary API of the attendance session engine.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Open a session for a course.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: unknown course
    /// - `Forbidden`: caller is not the owning faculty
    /// - `Conflict`: a session is already active for the course
    async fn start_session(
        &self,
        caller: &Caller,
        course_id: &CourseId,
    ) -> SessionResult<SessionStarted>;

    /// End the course's session. Ending an absent session is a no-op.
    ///
    /// Returns whether a session was actually ended.
    async fn end_session(&self, caller: &Caller, course_id: &CourseId) -> SessionResult<bool>;

    /// Redeem a token for the calling student.
    async fn redeem(&self, caller: &Caller, request: RedeemRequest)
        -> SessionResult<RedeemReceipt>;

    /// Whether the course has an active session. Never fails.
    fn session_status(&self, course_id: &CourseId) -> SessionStatus;

    /// Full session state for the owning faculty's dashboard.
    async fn session_snapshot(
        &self,
        caller: &Caller,
        course_id: &CourseId,
    ) -> SessionResult<SessionSnapshot>;

    /// Ledger records for a course and day, owning faculty only.
    async fn attendance_report(
        &self,
        caller: &Caller,
        course_id: &CourseId,
        session_date: SessionDate,
    ) -> SessionResult<AttendanceReport>;

    /// The calling student's attendance history, newest first.
    async fn attendance_history(&self, caller: &Caller) -> SessionResult<Vec<AttendanceRecord>>;
}
