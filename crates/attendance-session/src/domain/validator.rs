//! Redemption Validator
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! | # | Check                        | Failure               |
//! |---|------------------------------|-----------------------|
//! | 1 | session exists and is Active | `NoActiveSession`     |
//! | 2 | token equals current token   | `InvalidToken`        |
//! | 3 | now < token expiry           | `TokenExpired`        |
//! | 4 | location inside geofence     | `TooFarFromClassroom` |
//! | 5 | student not yet credited     | `AlreadyMarked`       |
//! | 6 | student enrolled             | `NotEnrolled`         |
//!
//! Wrong and superseded tokens both fail check 2 with the same error so a
//! guesser learns nothing about staleness.

use crate::domain::geofence::Geofence;
use crate::domain::session::Session;
use crate::error::{SessionError, SessionResult};
use chrono::{DateTime, Utc};
use shared_types::{GeoPoint, UserId};

/// One redemption attempt as submitted by a student.
#[derive(Clone, Copy, Debug)]
pub struct RedemptionAttempt<'a> {
    pub student_id: &'a UserId,
    pub token: &'a str,
    pub location: Option<GeoPoint>,
    pub enrolled: bool,
}

/// Outcome of a passing validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validated {
    /// Rounded distance to the classroom, when geofencing applied.
    pub distance_m: Option<u32>,
}

/// Validate an attempt against the session's current state.
///
/// `geofence` is `None` when geofencing is disabled.
pub fn validate(
    session: Option<&Session>,
    attempt: &RedemptionAttempt<'_>,
    geofence: Option<&Geofence>,
    now: DateTime<Utc>,
) -> SessionResult<Validated> {
    // 1. Session exists and is Active
    let session = match session {
        Some(s) if s.is_active() => s,
        _ => return Err(SessionError::NoActiveSession),
    };

    // 2. Token is the current one
    if !session.current_token().matches(attempt.token) {
        return Err(SessionError::InvalidToken);
    }

    // 3. Token still inside its window
    if now >= session.token_expires_at() {
        return Err(SessionError::TokenExpired);
    }

    // 4. Geofence
    let distance_m = match geofence {
        Some(fence) => {
            let location = attempt
                .location
                .filter(GeoPoint::is_valid)
                .ok_or(SessionError::LocationRequired)?;
            Some(fence.check(location)?)
        }
        None => None,
    };

    // 5. One redemption per student per session
    if session.has_redeemed(attempt.student_id) {
        return Err(SessionError::AlreadyMarked);
    }

    // 6. Enrollment
    if !attempt.enrolled {
        return Err(SessionError::NotEnrolled);
    }

    Ok(Validated { distance_m })
}
