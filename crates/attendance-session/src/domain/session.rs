//! Session State Machine
//!
//! Per-course attendance window. Idle is implicit (no entry in the
//! registry), so the stored states are only Active and Expired.
//!
//! ```text
//! (absent) ──start──→ [ACTIVE] ──tick (under cap)──→ [ACTIVE] (rotation + 1)
//!                         │
//!                         ├── tick (cap reached) ──→ [EXPIRED] ──→ (removed)
//!                         └── end ─────────────────→ [EXPIRED] ──→ (removed)
//! ```
//!
//! Invariants:
//! - The current token redeems only while Active and before its expiry.
//! - A student appears in the redeemed set at most once per session; the
//!   set survives rotations.

use crate::domain::token::{SessionToken, TokenGenerator};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{CourseId, SessionDate, UserId};
use std::collections::HashSet;

/// Stored session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Expired,
}

/// Result of a rotation tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A fresh token replaced the previous one.
    Rotated {
        token: SessionToken,
        expires_at: DateTime<Utc>,
        rotation: u32,
    },
    /// The rotation cap was reached; the session is now Expired.
    CapReached,
    /// The session was already terminal; nothing changed.
    Inactive,
}

/// A credited student, in redemption order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionEntry {
    pub student_id: UserId,
    pub name: String,
    pub redeemed_at: DateTime<Utc>,
    pub distance_m: Option<u32>,
}

/// Authoritative view handed to a (re)connecting dashboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub course_id: CourseId,
    pub state: SessionState,
    pub session_date: SessionDate,
    pub started_at: DateTime<Utc>,
    pub token: SessionToken,
    pub token_issued_at: DateTime<Utc>,
    pub token_expires_at: DateTime<Utc>,
    pub rotation_count: u32,
    pub max_rotations: Option<u32>,
    pub redeemed: Vec<RedemptionEntry>,
}

/// Per-course session state.
#[derive(Debug)]
pub struct Session {
    course_id: CourseId,
    state: SessionState,
    session_date: SessionDate,
    started_at: DateTime<Utc>,
    current_token: SessionToken,
    token_issued_at: DateTime<Utc>,
    token_expires_at: DateTime<Utc>,
    rotation_period: ChronoDuration,
    rotation_count: u32,
    max_rotations: Option<u32>,
    redeemed_by: HashSet<UserId>,
    redeemed_order: Vec<RedemptionEntry>,
}

impl Session {
    /// Open a session with its first token. The rotation count starts at 1.
    pub fn start(
        course_id: CourseId,
        token: SessionToken,
        now: DateTime<Utc>,
        rotation_period: std::time::Duration,
        max_rotations: Option<u32>,
    ) -> Self {
        // An unrepresentable period fails closed: tokens expire on issue.
        let rotation_period =
            ChronoDuration::from_std(rotation_period).unwrap_or_else(|_| ChronoDuration::zero());
        Self {
            course_id,
            state: SessionState::Active,
            session_date: SessionDate::from_utc(now),
            started_at: now,
            current_token: token,
            token_issued_at: now,
            token_expires_at: now + rotation_period,
            rotation_period,
            rotation_count: 1,
            max_rotations,
            redeemed_by: HashSet::new(),
            redeemed_order: Vec::new(),
        }
    }

    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn session_date(&self) -> SessionDate {
        self.session_date
    }

    pub fn current_token(&self) -> &SessionToken {
        &self.current_token
    }

    pub fn token_issued_at(&self) -> DateTime<Utc> {
        self.token_issued_at
    }

    pub fn token_expires_at(&self) -> DateTime<Utc> {
        self.token_expires_at
    }

    pub fn rotation_count(&self) -> u32 {
        self.rotation_count
    }

    pub fn has_redeemed(&self, student: &UserId) -> bool {
        self.redeemed_by.contains(student)
    }

    pub fn redeemed_count(&self) -> usize {
        self.redeemed_order.len()
    }

    /// True once the configured number of tokens has been issued.
    pub fn cap_reached(&self) -> bool {
        self.max_rotations
            .is_some_and(|cap| self.rotation_count >= cap)
    }

    /// Apply a scheduler tick.
    ///
    /// A tick against a terminal session is a no-op so a tick that raced an
    /// explicit end never rotates a dead session.
    pub fn on_tick(&mut self, generator: &dyn TokenGenerator, now: DateTime<Utc>) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Inactive;
        }

        if self.cap_reached() {
            self.expire();
            return TickOutcome::CapReached;
        }

        self.rotate(generator.generate(), now);
        TickOutcome::Rotated {
            token: self.current_token.clone(),
            expires_at: self.token_expires_at,
            rotation: self.rotation_count,
        }
    }

    /// Replace the current token. The previous token stops redeeming
    /// immediately, whatever its nominal expiry.
    pub fn rotate(&mut self, token: SessionToken, now: DateTime<Utc>) {
        self.current_token = token;
        self.token_issued_at = now;
        self.token_expires_at = now + self.rotation_period;
        self.rotation_count = self.rotation_count.saturating_add(1);
    }

    /// Move to the terminal state. Returns true if this call ended an
    /// active session.
    pub fn expire(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = SessionState::Expired;
        was_active
    }

    /// Credit a student. Returns false if they were already credited.
    pub fn record_redemption(&mut self, entry: RedemptionEntry) -> bool {
        if !self.redeemed_by.insert(entry.student_id.clone()) {
            return false;
        }
        self.redeemed_order.push(entry);
        true
    }

    /// Undo a credit whose durable write failed.
    pub fn forget_redemption(&mut self, student: &UserId) {
        if self.redeemed_by.remove(student) {
            self.redeemed_order.retain(|e| &e.student_id != student);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            course_id: self.course_id.clone(),
            state: self.state,
            session_date: self.session_date,
            started_at: self.started_at,
            token: self.current_token.clone(),
            token_issued_at: self.token_issued_at,
            token_expires_at: self.token_expires_at,
            rotation_count: self.rotation_count,
            max_rotations: self.max_rotations,
            redeemed: self.redeemed_order.clone(),
        }
    }
}
