//! # Classroom Flows
//!
//! The engine wired to its in-memory adapters and the course bus, driven
//! through whole sessions on paused time.
//!
//! ## Flow Tested
//!
//! ```text
//! faculty start ──→ TokenRotated(1) ──→ dashboard
//! student redeem ──→ ledger insert ──→ StudentRedeemed ──→ dashboard
//! +10s tick ──→ TokenRotated(2)
//! +20s tick ──→ SessionEnded(RotationCapReached), course idle
//! ```

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use attendance_session::{
        AttendanceApi, AttendanceLedger, EndReason, SessionConfig, SessionError, SessionEvent,
    };
    use shared_types::{CourseId, SessionDate};

    fn cs101() -> CourseId {
        CourseId::new("cs101")
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_capped_session() {
        let room = classroom(
            SessionConfig::default(),
            vec![course("cs101", "f1", &["s1", "s2", "s3"])],
        );
        let mut dashboard = room.bus.subscribe(&cs101());

        // Open: rotation 1, token t1 valid for one period.
        let started = room.service.start_session(&faculty("f1"), &cs101()).await.unwrap();
        assert!(started.token.matches("t1"));
        assert_eq!(started.rotation, 1);
        assert_eq!(started.expires_at, class_start() + chrono::Duration::seconds(10));
        assert_eq!(started.session_date.to_string(), "2024-09-02");

        // s1 redeems t1 from inside the room.
        advance_secs(3).await;
        let receipt = room
            .service
            .redeem(&student("s1"), redeem("cs101", "t1", Some(NEAR_CLASSROOM)))
            .await
            .unwrap();
        let distance = receipt.distance_m.unwrap();
        assert!((50..=60).contains(&distance), "distance {distance}");

        // Rotation: t1 is superseded by t2.
        advance_secs(8).await;
        let err = room
            .service
            .redeem(&student("s2"), redeem("cs101", "t1", Some(CLASSROOM)))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidToken);

        room.service
            .redeem(&student("s2"), redeem("cs101", "t2", Some(CLASSROOM)))
            .await
            .unwrap();

        // s1 cannot redeem again with the new token.
        let err = room
            .service
            .redeem(&student("s1"), redeem("cs101", "t2", Some(CLASSROOM)))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyMarked);

        // s3 is across town.
        let err = room
            .service
            .redeem(&student("s3"), redeem("cs101", "t2", Some(ACROSS_TOWN)))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::TooFarFromClassroom { .. }));

        // Cap reached at the second tick.
        advance_secs(10).await;
        assert!(!room.service.session_status(&cs101()).active);
        let err = room
            .service
            .redeem(&student("s3"), redeem("cs101", "t2", Some(CLASSROOM)))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::NoActiveSession);

        // Dashboard saw the whole session in order.
        let kinds: Vec<_> = drain(&mut dashboard)
            .into_iter()
            .map(|e| match e {
                SessionEvent::TokenRotated { rotation, .. } => format!("rotated:{rotation}"),
                SessionEvent::StudentRedeemed { student_id, .. } => format!("redeemed:{student_id}"),
                SessionEvent::SessionEnded { reason } => format!("ended:{reason:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "rotated:1",
                "redeemed:s1",
                "rotated:2",
                "redeemed:s2",
                "ended:RotationCapReached",
            ]
        );

        // Ledger holds exactly the two credited students.
        let date = SessionDate::from_utc(class_start());
        let report = room
            .service
            .attendance_report(&faculty("f1"), &cs101(), date)
            .await
            .unwrap();
        let mut present: Vec<_> = report.records.iter().map(|r| r.student_id.as_str()).collect();
        present.sort_unstable();
        assert_eq!(present, vec!["s1", "s2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopened_session_same_day_keeps_one_record() {
        let room = classroom(SessionConfig::default(), vec![course("cs101", "f1", &["s1"])]);

        room.service.start_session(&faculty("f1"), &cs101()).await.unwrap();
        room.service
            .redeem(&student("s1"), redeem("cs101", "t1", Some(CLASSROOM)))
            .await
            .unwrap();
        assert!(room.service.end_session(&faculty("f1"), &cs101()).await.unwrap());

        // Fresh session, empty redeemed set; the ledger still refuses.
        let reopened = room.service.start_session(&faculty("f1"), &cs101()).await.unwrap();
        let mut dashboard = room.bus.subscribe(&cs101());
        let err = room
            .service
            .redeem(
                &student("s1"),
                redeem("cs101", reopened.token.as_str(), Some(CLASSROOM)),
            )
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyMarked);
        assert!(drain(&mut dashboard).is_empty());

        // A resyncing dashboard agrees with the live stream.
        let snapshot = room
            .service
            .session_snapshot(&faculty("f1"), &cs101())
            .await
            .unwrap();
        assert!(snapshot.redeemed.is_empty());

        let records = room
            .ledger
            .records_for_session(&cs101(), SessionDate::from_utc(class_start()))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_courses_run_independently() {
        let room = classroom(
            SessionConfig::default(),
            vec![
                course("cs101", "f1", &["s1"]),
                course("ma201", "f2", &["s1"]),
            ],
        );
        let ma201 = CourseId::new("ma201");

        let a = room.service.start_session(&faculty("f1"), &cs101()).await.unwrap();
        let b = room.service.start_session(&faculty("f2"), &ma201).await.unwrap();
        assert_eq!(room.service.active_sessions(), 2);

        // A token only redeems in its own course.
        let err = room
            .service
            .redeem(&student("s1"), redeem("ma201", a.token.as_str(), Some(CLASSROOM)))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidToken);

        room.service
            .redeem(&student("s1"), redeem("ma201", b.token.as_str(), Some(CLASSROOM)))
            .await
            .unwrap();
        room.service
            .redeem(&student("s1"), redeem("cs101", a.token.as_str(), Some(CLASSROOM)))
            .await
            .unwrap();

        // Ending one course leaves the other running.
        room.service.end_session(&faculty("f1"), &cs101()).await.unwrap();
        assert!(!room.service.session_status(&cs101()).active);
        assert!(room.service.session_status(&ma201).active);

        let history = room
            .service
            .attendance_history(&student("s1"))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_session_until_shutdown() {
        let config = SessionConfig {
            max_rotations: None,
            ..SessionConfig::default()
        };
        let room = classroom(config, vec![course("cs101", "f1", &["s1"])]);
        let mut dashboard = room.bus.subscribe(&cs101());

        room.service.start_session(&faculty("f1"), &cs101()).await.unwrap();
        advance_secs(61).await;

        let snapshot = room
            .service
            .session_snapshot(&faculty("f1"), &cs101())
            .await
            .unwrap();
        assert_eq!(snapshot.rotation_count, 7);
        assert!(snapshot.token.matches("t7"));

        assert_eq!(room.service.shutdown().await, 1);
        let events = drain(&mut dashboard);
        assert_eq!(
            events.last(),
            Some(&SessionEvent::SessionEnded {
                reason: EndReason::Shutdown
            })
        );

        // No ticks after shutdown.
        advance_secs(60).await;
        assert!(drain(&mut dashboard).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrollment_is_read_per_redemption() {
        let room = classroom(SessionConfig::default(), vec![course("cs101", "f1", &[])]);
        room.service.start_session(&faculty("f1"), &cs101()).await.unwrap();

        let err = room
            .service
            .redeem(&student("s9"), redeem("cs101", "t1", Some(CLASSROOM)))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::NotEnrolled);

        // Late enrollment takes effect in the running session.
        room.directory.upsert(course("cs101", "f1", &["s9"]));

        room.service
            .redeem(&student("s9"), redeem("cs101", "t1", Some(CLASSROOM)))
            .await
            .unwrap();
    }
}
