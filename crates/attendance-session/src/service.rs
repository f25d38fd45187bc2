//! # Attendance Service
//!
//! Session Registry and Redemption Validator behind [`AttendanceApi`].
//!
//! ## Locking
//!
//! | Resource              | Guard                         | Scope                      |
//! |-----------------------|-------------------------------|----------------------------|
//! | registry              | `DashMap` shard lock          | per course hash shard      |
//! | one course's session  | `parking_lot::Mutex<Session>` | rotation, redemption, end  |
//! | one course's timer    | `parking_lot::Mutex<Option<_>>` | start, end, cap          |
//!
//! | one course's events   | `tokio::sync::Mutex<()>`      | state change through publish |
//!
//! Lock order is events, then registry shard, then session. Only the events
//! lock is held across an await: the ledger write happens with no lock held,
//! and each publish happens under the events lock of the session it
//! describes, so a dashboard sees one session's events in the order its
//! state changed. A crash between the in-memory mark and the ledger write
//! loses only the in-memory mark; the ledger's unique index still holds.
//!
//! ## Termination
//!
//! A session ends by explicit end, by the rotation cap, or by shutdown.
//! Whoever moves it from Active to Expired publishes `SessionEnded`, so the
//! event fires exactly once even if an end races the final tick. A start
//! that replaces a session expired by its final tick waits for that
//! session's `SessionEnded` before announcing its own first token.

use crate::adapters::MonotonicClock;
use crate::config::SessionConfig;
use crate::domain::{
    validate, AttendanceRecord, EndReason, Geofence, OsTokenGenerator, RedemptionAttempt,
    RedemptionEntry, Session, SessionEvent, SessionSnapshot, SessionState, TickOutcome,
    TokenGenerator,
};
use crate::error::{SessionError, SessionResult};
use crate::ports::{
    AttendanceApi, AttendanceLedger, AttendanceReport, Clock, CourseDirectory, InsertOutcome,
    RedeemReceipt, RedeemRequest, SessionEventPublisher, SessionStarted, SessionStatus,
};
use crate::scheduler::RotationTimer;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use shared_types::{Caller, CourseId, CourseRecord, SessionDate};
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

/// Registry entry for one course.
struct SessionSlot {
    session: Mutex<Session>,
    timer: Mutex<Option<RotationTimer>>,
    /// Held from a state change until its event is published.
    events: AsyncMutex<()>,
}

impl SessionSlot {
    fn new(session: Session) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            timer: Mutex::new(None),
            events: AsyncMutex::new(()),
        })
    }

    fn is_active(&self) -> bool {
        self.session.lock().is_active()
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.cancel();
        }
    }

    /// Drop the handle without aborting. Used from inside the timer task.
    fn detach_timer(&self) {
        self.timer.lock().take();
    }
}

struct Core {
    config: SessionConfig,
    sessions: DashMap<CourseId, Arc<SessionSlot>>,
    directory: Arc<dyn CourseDirectory>,
    ledger: Arc<dyn AttendanceLedger>,
    publisher: Arc<SessionEventPublisher>,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
}

impl Core {
    fn slot(&self, course_id: &CourseId) -> Option<Arc<SessionSlot>> {
        self.sessions.get(course_id).map(|e| Arc::clone(e.value()))
    }

    async fn find_course(&self, course_id: &CourseId) -> SessionResult<CourseRecord> {
        self.directory
            .find_course(course_id)
            .await
            .map_err(|e| {
                error!(course_id = %course_id, error = %e, "Course lookup failed");
                SessionError::from(e)
            })?
            .ok_or_else(|| SessionError::NotFound {
                course_id: course_id.clone(),
            })
    }

    /// Resolve a course the caller owns as faculty.
    async fn owned_course(&self, caller: &Caller, course_id: &CourseId) -> SessionResult<CourseRecord> {
        if !caller.is_faculty() {
            return Err(SessionError::forbidden("faculty only"));
        }
        let course = self.find_course(course_id).await?;
        if !course.is_owned_by(&caller.user_id) {
            warn!(course_id = %course_id, user_id = %caller.user_id, "Caller does not own course");
            return Err(SessionError::forbidden("you do not own this course"));
        }
        Ok(course)
    }

    fn open_slot(&self, course_id: &CourseId) -> Arc<SessionSlot> {
        SessionSlot::new(Session::start(
            course_id.clone(),
            self.tokens.generate(),
            self.clock.now(),
            self.config.rotation_period(),
            self.config.max_rotations,
        ))
    }

    fn spawn_rotation(self: &Arc<Self>, course_id: &CourseId, slot: &Arc<SessionSlot>) {
        let core = Arc::downgrade(self);
        let tick_slot = Arc::clone(slot);
        let course_id = course_id.clone();

        let timer = RotationTimer::spawn(self.config.rotation_period(), move || {
            let core: Weak<Core> = core.clone();
            let slot = Arc::clone(&tick_slot);
            let course_id = course_id.clone();
            async move {
                match core.upgrade() {
                    Some(core) => core.tick(&course_id, &slot).await,
                    // Service dropped without shutdown.
                    None => ControlFlow::Break(()),
                }
            }
        });

        *slot.timer.lock() = Some(timer);
    }

    async fn tick(&self, course_id: &CourseId, slot: &Arc<SessionSlot>) -> ControlFlow<()> {
        let _events = slot.events.lock().await;
        let now = self.clock.now();
        let outcome = slot.session.lock().on_tick(self.tokens.as_ref(), now);

        match outcome {
            TickOutcome::Rotated {
                token,
                expires_at,
                rotation,
            } => {
                info!(course_id = %course_id, rotation, "Token rotated");
                self.publisher
                    .publish(
                        course_id,
                        SessionEvent::TokenRotated {
                            token,
                            expires_at,
                            rotation,
                        },
                    )
                    .await;
                ControlFlow::Continue(())
            }
            TickOutcome::CapReached => {
                info!(course_id = %course_id, reason = "rotation_cap_reached", "Session ended");
                // Announce before deregistering: a start that finds the key
                // vacant must come after this event.
                self.publisher
                    .publish(
                        course_id,
                        SessionEvent::SessionEnded {
                            reason: EndReason::RotationCapReached,
                        },
                    )
                    .await;
                // A newer session may already occupy the key.
                self.sessions
                    .remove_if(course_id, |_, current| Arc::ptr_eq(current, slot));
                slot.detach_timer();
                ControlFlow::Break(())
            }
            TickOutcome::Inactive => ControlFlow::Break(()),
        }
    }

    /// Remove, cancel and expire the course's session.
    async fn terminate(&self, course_id: &CourseId, reason: EndReason) -> bool {
        let Some((_, slot)) = self.sessions.remove(course_id) else {
            return false;
        };

        let _events = slot.events.lock().await;
        slot.cancel_timer();
        let ended = slot.session.lock().expire();
        if ended {
            info!(course_id = %course_id, reason = ?reason, "Session ended");
            self.publisher
                .publish(course_id, SessionEvent::SessionEnded { reason })
                .await;
        }
        ended
    }
}

/// The attendance session engine.
///
/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct AttendanceService {
    core: Arc<Core>,
}

/// Builder for [`AttendanceService`].
pub struct AttendanceServiceBuilder {
    config: SessionConfig,
    directory: Arc<dyn CourseDirectory>,
    ledger: Arc<dyn AttendanceLedger>,
    publisher: Arc<SessionEventPublisher>,
    clock: Option<Arc<dyn Clock>>,
    tokens: Option<Arc<dyn TokenGenerator>>,
}

impl AttendanceServiceBuilder {
    /// Replace the default [`MonotonicClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the default [`OsTokenGenerator`].
    pub fn token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Validate the configuration and build the service.
    pub fn build(self) -> SessionResult<AttendanceService> {
        self.config.validate()?;

        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(OsTokenGenerator::new(self.config.token_bytes)));
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        Ok(AttendanceService {
            core: Arc::new(Core {
                config: self.config,
                sessions: DashMap::new(),
                directory: self.directory,
                ledger: self.ledger,
                publisher: self.publisher,
                clock,
                tokens,
            }),
        })
    }
}

impl AttendanceService {
    pub fn builder(
        config: SessionConfig,
        directory: Arc<dyn CourseDirectory>,
        ledger: Arc<dyn AttendanceLedger>,
        publisher: Arc<SessionEventPublisher>,
    ) -> AttendanceServiceBuilder {
        AttendanceServiceBuilder {
            config,
            directory,
            ledger,
            publisher,
            clock: None,
            tokens: None,
        }
    }

    /// Build with the default clock and token generator.
    pub fn new(
        config: SessionConfig,
        directory: Arc<dyn CourseDirectory>,
        ledger: Arc<dyn AttendanceLedger>,
        publisher: Arc<SessionEventPublisher>,
    ) -> SessionResult<Self> {
        Self::builder(config, directory, ledger, publisher).build()
    }

    /// Number of courses with an active session.
    pub fn active_sessions(&self) -> usize {
        self.core
            .sessions
            .iter()
            .filter(|e| e.value().is_active())
            .count()
    }

    /// End every session with reason `Shutdown`. Returns how many ended.
    pub async fn shutdown(&self) -> usize {
        let courses: Vec<CourseId> = self.core.sessions.iter().map(|e| e.key().clone()).collect();

        let mut ended = 0;
        for course_id in &courses {
            if self.core.terminate(course_id, EndReason::Shutdown).await {
                ended += 1;
            }
        }
        info!(ended, "All sessions closed");
        ended
    }

    fn geofence_for(&self, course: &CourseRecord) -> Option<Geofence> {
        self.core
            .config
            .geofence_enabled
            .then(|| Geofence::new(course.classroom, self.core.config.geofence_radius_m))
    }
}

#[async_trait]
impl AttendanceApi for AttendanceService {
    async fn start_session(
        &self,
        caller: &Caller,
        course_id: &CourseId,
    ) -> SessionResult<SessionStarted> {
        self.core.owned_course(caller, course_id).await?;

        let (slot, replaced) = match self.core.sessions.entry(course_id.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_active() {
                    warn!(course_id = %course_id, "Start rejected: session already active");
                    return Err(SessionError::Conflict {
                        course_id: course_id.clone(),
                    });
                }
                // Expired by its final tick but not yet deregistered.
                let slot = self.core.open_slot(course_id);
                let replaced = entry.insert(Arc::clone(&slot));
                (slot, Some(replaced))
            }
            Entry::Vacant(entry) => {
                let slot = self.core.open_slot(course_id);
                entry.insert(Arc::clone(&slot));
                (slot, None)
            }
        };

        // The tick that expired the replaced session holds its events lock
        // until SessionEnded is out.
        if let Some(replaced) = replaced {
            drop(replaced.events.lock().await);
        }

        let _events = slot.events.lock().await;
        let started = {
            let session = slot.session.lock();
            if !session.is_active() {
                None
            } else {
                Some(SessionStarted {
                    course_id: course_id.clone(),
                    token: session.current_token().clone(),
                    expires_at: session.token_expires_at(),
                    session_date: session.session_date(),
                    rotation: session.rotation_count(),
                })
            }
        };
        let Some(started) = started else {
            warn!(course_id = %course_id, "Session ended before its first token was announced");
            return Err(SessionError::NoActiveSession);
        };

        self.core.spawn_rotation(course_id, &slot);

        info!(
            course_id = %course_id,
            session_date = %started.session_date,
            rotation_period_secs = self.core.config.rotation_period_secs,
            max_rotations = ?self.core.config.max_rotations,
            "Session started"
        );

        self.core
            .publisher
            .publish(
                course_id,
                SessionEvent::TokenRotated {
                    token: started.token.clone(),
                    expires_at: started.expires_at,
                    rotation: started.rotation,
                },
            )
            .await;

        Ok(started)
    }

    async fn end_session(&self, caller: &Caller, course_id: &CourseId) -> SessionResult<bool> {
        self.core.owned_course(caller, course_id).await?;

        let ended = self.core.terminate(course_id, EndReason::Ended).await;
        if !ended {
            debug!(course_id = %course_id, "End requested with no active session");
        }
        Ok(ended)
    }

    async fn redeem(
        &self,
        caller: &Caller,
        request: RedeemRequest,
    ) -> SessionResult<RedeemReceipt> {
        if !caller.is_student() {
            return Err(SessionError::forbidden("only students can mark attendance"));
        }

        let course_id = &request.course_id;
        let student_id = &caller.user_id;

        let Some(slot) = self.core.slot(course_id) else {
            warn!(course_id = %course_id, student_id = %student_id, reason = %SessionError::NoActiveSession, "Redemption rejected");
            return Err(SessionError::NoActiveSession);
        };

        let course = self.core.find_course(course_id).await?;
        let geofence = self.geofence_for(&course);
        let attempt = RedemptionAttempt {
            student_id,
            token: &request.token,
            location: request.location,
            enrolled: course.is_enrolled(student_id),
        };

        let now = self.core.clock.now();
        let (session_date, distance_m) = {
            let mut session = slot.session.lock();
            let validated = validate(Some(&*session), &attempt, geofence.as_ref(), now)
                .inspect_err(|err| {
                    warn!(course_id = %course_id, student_id = %student_id, reason = %err, "Redemption rejected");
                })?;

            session.record_redemption(RedemptionEntry {
                student_id: student_id.clone(),
                name: caller.name.clone(),
                redeemed_at: now,
                distance_m: validated.distance_m,
            });
            (session.session_date(), validated.distance_m)
        };

        let record = AttendanceRecord::new(course_id.clone(), student_id.clone(), session_date, now)
            .with_location(request.location, distance_m);

        match self.core.ledger.insert_if_absent(record).await {
            Ok(InsertOutcome::Inserted) => {}
            Ok(InsertOutcome::AlreadyExists) => {
                // Credited by an earlier session today; this one never
                // announced the student, so it must not list them either.
                slot.session.lock().forget_redemption(student_id);
                warn!(
                    course_id = %course_id,
                    student_id = %student_id,
                    session_date = %session_date,
                    "Ledger already holds attendance for this day"
                );
                return Err(SessionError::AlreadyMarked);
            }
            Err(e) => {
                error!(course_id = %course_id, student_id = %student_id, error = %e, "Ledger write failed");
                slot.session.lock().forget_redemption(student_id);
                return Err(e.into());
            }
        }

        info!(course_id = %course_id, student_id = %student_id, distance_m = ?distance_m, "Attendance marked");

        let _events = slot.events.lock().await;
        if slot.is_active() {
            self.core
                .publisher
                .publish(
                    course_id,
                    SessionEvent::StudentRedeemed {
                        student_id: student_id.clone(),
                        name: caller.name.clone(),
                        email: caller.email.clone(),
                        timestamp: now,
                        distance_m,
                    },
                )
                .await;
        } else {
            debug!(course_id = %course_id, student_id = %student_id, "Session ended before the redemption was announced");
        }

        Ok(RedeemReceipt {
            course_id: course_id.clone(),
            session_date,
            timestamp: now,
            distance_m,
        })
    }

    fn session_status(&self, course_id: &CourseId) -> SessionStatus {
        let session_date = self.core.slot(course_id).and_then(|slot| {
            let session = slot.session.lock();
            session.is_active().then(|| session.session_date())
        });

        SessionStatus {
            course_id: course_id.clone(),
            active: session_date.is_some(),
            session_date,
        }
    }

    async fn session_snapshot(
        &self,
        caller: &Caller,
        course_id: &CourseId,
    ) -> SessionResult<SessionSnapshot> {
        self.core.owned_course(caller, course_id).await?;

        self.core
            .slot(course_id)
            .map(|slot| slot.session.lock().snapshot())
            .filter(|snapshot| snapshot.state == SessionState::Active)
            .ok_or(SessionError::NoActiveSession)
    }

    async fn attendance_report(
        &self,
        caller: &Caller,
        course_id: &CourseId,
        session_date: SessionDate,
    ) -> SessionResult<AttendanceReport> {
        self.core.owned_course(caller, course_id).await?;

        let records = self
            .core
            .ledger
            .records_for_session(course_id, session_date)
            .await?;

        Ok(AttendanceReport {
            course_id: course_id.clone(),
            session_date,
            records,
        })
    }

    async fn attendance_history(
        &self,
        caller: &Caller,
    ) -> SessionResult<Vec<AttendanceRecord>> {
        if !caller.is_student() {
            return Err(SessionError::forbidden("only students have attendance history"));
        }
        Ok(self.core.ledger.history_for_student(&caller.user_id).await?)
    }
}
