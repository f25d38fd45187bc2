//! Live dashboard events
//!
//! Pushed per course through the shared bus. Delivery is best-effort; a
//! dashboard that misses one resyncs from the next event or a snapshot.

use crate::domain::token::SessionToken;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared_bus::BusEvent;
use shared_types::UserId;

/// Why a session stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Explicit end action by the owning faculty.
    Ended,
    /// The configured number of tokens was issued.
    RotationCapReached,
    /// The process is shutting down.
    Shutdown,
}

/// Event pushed to the dashboards subscribed to a course.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A new token is current.
    TokenRotated {
        token: SessionToken,
        expires_at: DateTime<Utc>,
        rotation: u32,
    },
    /// A student was credited.
    StudentRedeemed {
        student_id: UserId,
        name: String,
        email: String,
        timestamp: DateTime<Utc>,
        distance_m: Option<u32>,
    },
    /// The session is gone; the course is idle again.
    SessionEnded { reason: EndReason },
}

impl BusEvent for SessionEvent {
    fn kind(&self) -> &'static str {
        match self {
            SessionEvent::TokenRotated { .. } => "token-rotated",
            SessionEvent::StudentRedeemed { .. } => "student-redeemed",
            SessionEvent::SessionEnded { .. } => "session-ended",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let event = SessionEvent::SessionEnded {
            reason: EndReason::RotationCapReached,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "session-ended");
        assert_eq!(json["reason"], "rotation_cap_reached");
    }

    #[test]
    fn test_kind_matches_tag() {
        let event = SessionEvent::TokenRotated {
            token: SessionToken::new("ab"),
            expires_at: Utc::now(),
            rotation: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.kind());
        assert_eq!(json["token"], "ab");
    }
}
