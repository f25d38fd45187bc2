//! Error types for the attendance session engine
//!
//! Every redemption failure is client-correctable and is surfaced verbatim;
//! nothing here is retried by the server.

use shared_types::CourseId;
use thiserror::Error;

/// Session engine errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// Caller role or course ownership check failed
    #[error("Access denied: {reason}")]
    Forbidden { reason: String },

    /// A session is already active for the course
    #[error("An attendance session is already active for course {course_id}")]
    Conflict { course_id: CourseId },

    /// Unknown course
    #[error("Course not found: {course_id}")]
    NotFound { course_id: CourseId },

    /// No active session for the course
    #[error("No active attendance session")]
    NoActiveSession,

    /// Submitted token is wrong or has been superseded by a rotation.
    /// The two cases are deliberately indistinguishable.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Submitted token is current but its validity window has closed
    #[error("Token has expired")]
    TokenExpired,

    /// Redemption location is outside the classroom geofence
    #[error("You are too far from the classroom. Distance: {distance_m}m (Max allowed: {radius_m}m)")]
    TooFarFromClassroom { distance_m: u32, radius_m: u32 },

    /// Geofencing is enabled but no usable location was submitted
    #[error("A valid location is required to mark attendance")]
    LocationRequired,

    /// Student already credited for this session
    #[error("You have already been marked present for this session")]
    AlreadyMarked,

    /// Student is not enrolled in the course
    #[error("You are not enrolled in this course")]
    NotEnrolled,

    /// Configuration rejected at construction
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Attendance ledger failure (not a uniqueness conflict)
    #[error("Attendance ledger error: {reason}")]
    Ledger { reason: String },

    /// Course directory failure
    #[error("Course directory error: {reason}")]
    Directory { reason: String },
}

impl SessionError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// True for failures the caller can fix by changing the request
    /// (rescan, move closer, enrol), as opposed to infrastructure faults.
    pub fn is_client_correctable(&self) -> bool {
        matches!(
            self,
            Self::NoActiveSession
                | Self::InvalidToken
                | Self::TokenExpired
                | Self::TooFarFromClassroom { .. }
                | Self::LocationRequired
                | Self::AlreadyMarked
                | Self::NotEnrolled
        )
    }
}

/// Result type for session engine operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Attendance ledger failures other than a uniqueness conflict, which is a
/// normal outcome (`InsertOutcome::AlreadyExists`).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Course directory failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("course directory unavailable: {0}")]
    Unavailable(String),
}

impl From<LedgerError> for SessionError {
    fn from(err: LedgerError) -> Self {
        SessionError::Ledger {
            reason: err.to_string(),
        }
    }
}

impl From<DirectoryError> for SessionError {
    fn from(err: DirectoryError) -> Self {
        SessionError::Directory {
            reason: err.to_string(),
        }
    }
}
