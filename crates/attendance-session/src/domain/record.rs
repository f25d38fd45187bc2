//! Attendance ledger records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{CourseId, GeoPoint, SessionDate, UserId};
use uuid::Uuid;

/// Uniqueness key of the ledger: one record per student, course and day.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttendanceKey {
    pub course_id: CourseId,
    pub student_id: UserId,
    pub session_date: SessionDate,
}

/// A durable attendance record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub course_id: CourseId,
    pub student_id: UserId,
    pub session_date: SessionDate,
    pub timestamp: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub distance_m: Option<u32>,
}

impl AttendanceRecord {
    pub fn new(
        course_id: CourseId,
        student_id: UserId,
        session_date: SessionDate,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            student_id,
            session_date,
            timestamp,
            location: None,
            distance_m: None,
        }
    }

    pub fn with_location(mut self, location: Option<GeoPoint>, distance_m: Option<u32>) -> Self {
        self.location = location;
        self.distance_m = distance_m;
        self
    }

    pub fn key(&self) -> AttendanceKey {
        AttendanceKey {
            course_id: self.course_id.clone(),
            student_id: self.student_id.clone(),
            session_date: self.session_date,
        }
    }
}
