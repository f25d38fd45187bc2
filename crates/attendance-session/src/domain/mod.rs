//! Domain layer: pure session logic with no I/O.

pub mod events;
pub mod geofence;
pub mod record;
pub mod session;
pub mod token;
pub mod validator;

pub use events::{EndReason, SessionEvent};
pub use geofence::{haversine_distance_m, Geofence, EARTH_RADIUS_M};
pub use record::{AttendanceKey, AttendanceRecord};
pub use session::{RedemptionEntry, Session, SessionSnapshot, SessionState, TickOutcome};
pub use token::{OsTokenGenerator, SessionToken, TokenGenerator};
pub use validator::{validate, RedemptionAttempt, Validated};
