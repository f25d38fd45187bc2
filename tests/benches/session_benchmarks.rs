//! # Session Hot-Path Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Haversine distance | < 1µs |
//! | Token generation (32 bytes) | < 10µs |
//! | Redemption (validate + ledger insert) | < 50µs |

use attendance_session::adapters::{session_bus, InMemoryCourseDirectory, InMemoryLedger};
use attendance_session::domain::{haversine_distance_m, OsTokenGenerator, TokenGenerator};
use attendance_session::{AttendanceApi, AttendanceService, RedeemRequest, SessionConfig};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use shared_types::{Caller, CourseId, CourseRecord, GeoPoint, UserId};
use std::sync::Arc;

const CLASSROOM: GeoPoint = GeoPoint::new(26.9124, 75.7873);

fn bench_geofence(c: &mut Criterion) {
    let student = GeoPoint::new(26.9129, 75.7880);
    c.bench_function("haversine_distance_m", |b| {
        b.iter(|| haversine_distance_m(black_box(CLASSROOM), black_box(student)))
    });
}

fn bench_token_generation(c: &mut Criterion) {
    let tokens = OsTokenGenerator::new(32);
    c.bench_function("token_generate_32_bytes", |b| b.iter(|| tokens.generate()));
}

fn bench_redeem(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let course_id = CourseId::new("cs101");
    let students: Vec<UserId> = (0..10_000).map(|i| UserId::new(format!("s{i}"))).collect();

    let config = SessionConfig {
        // Keep one token current for the whole run.
        rotation_period_secs: 3600,
        max_rotations: None,
        ..SessionConfig::default()
    };
    let directory: Arc<InMemoryCourseDirectory> = Arc::new(
        [CourseRecord {
            id: course_id.clone(),
            name: "Bench".into(),
            faculty: UserId::new("f1"),
            students: students.iter().cloned().collect(),
            classroom: CLASSROOM,
        }]
        .into_iter()
        .collect(),
    );
    let bus = session_bus(&config);
    let service =
        AttendanceService::new(config, directory, Arc::new(InMemoryLedger::new()), bus).unwrap();

    let token = runtime
        .block_on(service.start_session(&Caller::faculty("f1"), &course_id))
        .unwrap()
        .token;

    let mut next = students.iter().cycle();
    c.bench_function("redeem_accept", |b| {
        b.iter_batched(
            || {
                let student = next.next().cloned().unwrap_or_else(|| UserId::new("s0"));
                (
                    Caller::student(student.as_str()),
                    RedeemRequest {
                        course_id: course_id.clone(),
                        token: token.as_str().to_string(),
                        location: Some(CLASSROOM),
                    },
                )
            },
            |(caller, request)| {
                // Repeats after the first lap answer AlreadyMarked.
                let _ = runtime.block_on(service.redeem(&caller, request));
            },
            BatchSize::SmallInput,
        )
    });

    runtime.block_on(service.shutdown());
}

criterion_group!(benches, bench_geofence, bench_token_generation, bench_redeem);
criterion_main!(benches);
