//! # Attendance Session Engine
//!
//! Per-course rotating-token sessions. Faculty open a session, the engine
//! rotates a short-lived random token on a fixed cadence and pushes it to the
//! course dashboard, and students redeem the current token (plus their
//! location) to be marked present exactly once.
//!
//! ## Session Lifecycle
//!
//! ```text
//! (idle) ──start──→ [ACTIVE] ──tick──→ [ACTIVE] (new token, rotation + 1)
//!                      │
//!                      ├── tick at cap ──→ [EXPIRED] ──→ (idle)
//!                      ├── end ──────────→ [EXPIRED] ──→ (idle)
//!                      └── shutdown ─────→ [EXPIRED] ──→ (idle)
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | One active session per course | `service.rs` - registry entry check |
//! | Token redeems only while current and unexpired | `domain/validator.rs` |
//! | One redemption per student per session | `domain/session.rs` - redeemed set |
//! | One ledger record per (course, student, day) | `ports/outbound.rs` - `AttendanceLedger` contract |
//! | No rotation after termination | `domain/session.rs` - `on_tick` liveness check |
//!
//! ## Live Events
//!
//! | Event | Published By | When |
//! |-------|--------------|------|
//! | `TokenRotated` | start, scheduler | session opened, each rotation |
//! | `StudentRedeemed` | redeem | after the ledger accepted the record |
//! | `SessionEnded` | end, scheduler, shutdown | Active → Expired |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - in-memory ledger and directory, clock, event bus   │
//! │  service.rs - AttendanceService (registry + validator)          │
//! │  scheduler.rs - RotationTimer                                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - AttendanceApi trait                        │
//! │  ports/outbound.rs - AttendanceLedger, CourseDirectory, Clock   │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/session.rs   - Session state machine                    │
//! │  domain/validator.rs - ordered redemption checks                │
//! │  domain/token.rs     - SessionToken, TokenGenerator             │
//! │  domain/geofence.rs  - haversine distance, Geofence             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scaling
//!
//! The registry lives in process memory. A restart drops every session and
//! running several processes would give each its own registry; only the
//! ledger's unique index is shared.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod scheduler;
pub mod service;

pub use config::SessionConfig;
pub use domain::{
    AttendanceRecord, EndReason, SessionEvent, SessionSnapshot, SessionState, SessionToken,
};
pub use error::{DirectoryError, LedgerError, SessionError, SessionResult};
pub use ports::{
    AttendanceApi, AttendanceLedger, AttendanceReport, Clock, CourseDirectory, InsertOutcome,
    RedeemReceipt, RedeemRequest, SessionStarted, SessionStatus,
};
pub use service::{AttendanceService, AttendanceServiceBuilder};
