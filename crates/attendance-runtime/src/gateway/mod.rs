//! # HTTP/WebSocket Gateway
//!
//! | Method | Path | Operation | Caller |
//! |--------|------|-----------|--------|
//! | POST | `/api/faculty/courses/:course_id/session` | start session | owning faculty |
//! | DELETE | `/api/faculty/courses/:course_id/session` | end session | owning faculty |
//! | GET | `/api/faculty/courses/:course_id/session` | session snapshot | owning faculty |
//! | GET | `/api/faculty/attendance/:course_id/:date` | attendance report | owning faculty |
//! | POST | `/api/student/mark-attendance` | redeem token | student |
//! | GET | `/api/student/attendance-history` | attendance history | student |
//! | GET | `/api/courses/:course_id/status` | session status | anyone |
//! | GET | `/ws/courses/:course_id` | live dashboard | owning faculty |
//! | GET | `/health` | liveness | anyone |

pub mod caller;
pub mod error;
pub mod handlers;
pub mod ws;

use attendance_session::adapters::SessionBus;
use attendance_session::AttendanceService;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub use caller::AuthenticatedCaller;
pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: AttendanceService,
    pub bus: Arc<SessionBus>,
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/faculty/courses/:course_id/session",
            post(handlers::start_session)
                .delete(handlers::end_session)
                .get(handlers::session_snapshot),
        )
        .route(
            "/api/faculty/attendance/:course_id/:date",
            get(handlers::attendance_report),
        )
        .route("/api/student/mark-attendance", post(handlers::mark_attendance))
        .route(
            "/api/student/attendance-history",
            get(handlers::attendance_history),
        )
        .route("/api/courses/:course_id/status", get(handlers::session_status))
        .route("/ws/courses/:course_id", get(ws::dashboard))
        .route("/health", get(handlers::health))
        .with_state(state)
}
