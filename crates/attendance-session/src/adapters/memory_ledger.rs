//! In-memory attendance ledger with a unique index.

use crate::domain::{AttendanceKey, AttendanceRecord};
use crate::error::LedgerError;
use crate::ports::{AttendanceLedger, InsertOutcome};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{CourseId, SessionDate, UserId};
use std::collections::HashSet;

#[derive(Debug, Default)]
struct LedgerState {
    /// Unique index on (course, student, session date).
    keys: HashSet<AttendanceKey>,
    /// Records in insertion order.
    records: Vec<AttendanceRecord>,
}

/// Process-local ledger.
///
/// The index check and the append happen under one write lock, which makes
/// `insert_if_absent` atomic across concurrent writers.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AttendanceLedger for InMemoryLedger {
    async fn insert_if_absent(
        &self,
        record: AttendanceRecord,
    ) -> Result<InsertOutcome, LedgerError> {
        let mut state = self.state.write();
        if !state.keys.insert(record.key()) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state.records.push(record);
        Ok(InsertOutcome::Inserted)
    }

    async fn records_for_session(
        &self,
        course_id: &CourseId,
        session_date: SessionDate,
    ) -> Result<Vec<AttendanceRecord>, LedgerError> {
        Ok(self
            .state
            .read()
            .records
            .iter()
            .filter(|r| &r.course_id == course_id && r.session_date == session_date)
            .cloned()
            .collect())
    }

    async fn history_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<AttendanceRecord>, LedgerError> {
        let mut history: Vec<_> = self
            .state
            .read()
            .records
            .iter()
            .filter(|r| &r.student_id == student_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(history)
    }
}
