//! # Concurrent Redemption
//!
//! Many students, one token, real worker threads. Exactly one ledger
//! record per student and one `StudentRedeemed` per record.

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use attendance_session::{AttendanceApi, SessionConfig, SessionError, SessionEvent};
    use futures::future::join_all;
    use shared_types::CourseId;

    const CLASS_SIZE: usize = 40;

    fn roster() -> Vec<String> {
        (0..CLASS_SIZE).map(|i| format!("s{i:02}")).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_whole_class_redeems_at_once() {
        let roster = roster();
        let names: Vec<&str> = roster.iter().map(String::as_str).collect();
        let room = live_classroom(SessionConfig::default(), vec![course("cs101", "f1", &names)]);
        let course_id = CourseId::new("cs101");
        let mut dashboard = room.bus.subscribe(&course_id);

        let started = room.service.start_session(&faculty("f1"), &course_id).await.unwrap();
        let token = started.token.as_str().to_string();

        let attempts = roster.iter().map(|id| {
            let service = room.service.clone();
            let caller = student(id);
            let request = redeem("cs101", &token, Some(CLASSROOM));
            tokio::spawn(async move { service.redeem(&caller, request).await })
        });
        let results = join_all(attempts).await;

        assert!(results.into_iter().all(|r| r.unwrap().is_ok()));
        assert_eq!(room.ledger.len(), CLASS_SIZE);

        let redeemed = drain(&mut dashboard)
            .iter()
            .filter(|e| matches!(e, SessionEvent::StudentRedeemed { .. }))
            .count();
        assert_eq!(redeemed, CLASS_SIZE);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_one_student_many_devices() {
        let room = live_classroom(SessionConfig::default(), vec![course("cs101", "f1", &["s1"])]);
        let course_id = CourseId::new("cs101");

        let started = room.service.start_session(&faculty("f1"), &course_id).await.unwrap();
        let token = started.token.as_str().to_string();

        let attempts = (0..16).map(|_| {
            let service = room.service.clone();
            let request = redeem("cs101", &token, Some(CLASSROOM));
            tokio::spawn(async move { service.redeem(&student("s1"), request).await })
        });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == SessionError::AlreadyMarked));
        assert_eq!(room.ledger.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_open_one_session() {
        let room = live_classroom(SessionConfig::default(), vec![course("cs101", "f1", &[])]);
        let course_id = CourseId::new("cs101");

        let attempts = (0..8).map(|_| {
            let service = room.service.clone();
            let course_id = course_id.clone();
            tokio::spawn(async move { service.start_session(&faculty("f1"), &course_id).await })
        });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, SessionError::Conflict { .. })));
        assert_eq!(room.service.active_sessions(), 1);

        room.service.shutdown().await;
    }
}
