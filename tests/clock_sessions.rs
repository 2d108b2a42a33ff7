//! Clock session state machine against a real database.
//!
//! Requires a PostgreSQL server reachable through `DATABASE_URL`.

mod common;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use geofence_timeclock::error::AppError;
use geofence_timeclock::models::time_clock::ClockState;
use geofence_timeclock::models::worker::IdentifyOutcome;
use geofence_timeclock::services::clock_service;
use sqlx::PgPool;

const PHONE: &str = "555-0100";

fn t(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, hour, minute, 0).unwrap()
}

async fn register_jane(pool: &PgPool) {
    clock_service::register(pool, "Acme", "Jane Doe", PHONE, Some("dev-1"))
        .await
        .unwrap();
}

async fn open_entries(pool: &PgPool, phone: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM time_clock_entries WHERE phone_number = $1 AND clock_out IS NULL",
    )
    .bind(phone)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn register_then_find_by_phone(pool: PgPool) {
    let registered = clock_service::register(&pool, " Acme ", "Jane Doe", PHONE, Some("dev-1"))
        .await
        .unwrap();
    assert_eq!(registered.subcontractor, "Acme");

    let found = clock_service::find_by_phone(&pool, PHONE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, registered.id);
    assert_eq!(found.employee_name, "Jane Doe");
    assert_eq!(found.subcontractor, "Acme");
    assert_eq!(found.device_token.as_deref(), Some("dev-1"));
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_phone_is_refused(pool: PgPool) {
    register_jane(&pool).await;

    let second = clock_service::register(&pool, "Other Co", "John Roe", PHONE, Some("dev-2")).await;
    assert_matches!(second, Err(AppError::DuplicatePhone));

    // The original registration is untouched
    let worker = clock_service::find_by_phone(&pool, PHONE).await.unwrap().unwrap();
    assert_eq!(worker.employee_name, "Jane Doe");
    assert_eq!(worker.device_token.as_deref(), Some("dev-1"));
}

#[sqlx::test(migrations = "./migrations")]
async fn link_device_is_last_write_wins(pool: PgPool) {
    register_jane(&pool).await;

    clock_service::link_device(&pool, PHONE, "dev-2").await.unwrap();

    let by_new = clock_service::find_by_device(&pool, "dev-2").await.unwrap();
    assert_eq!(by_new.map(|w| w.phone_number), Some(PHONE.to_string()));
    assert!(clock_service::find_by_device(&pool, "dev-1").await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn link_device_keeps_clock_state(pool: PgPool) {
    register_jane(&pool).await;
    clock_service::clock_in(&pool, PHONE, "dev-1", 40.005, -75.005, "Alpha Yard", t(7, 0))
        .await
        .unwrap();

    clock_service::link_device(&pool, PHONE, "dev-2").await.unwrap();

    let status = clock_service::worker_status(&pool, PHONE).await.unwrap();
    assert_eq!(status.state, ClockState::ClockedIn);
}

#[sqlx::test(migrations = "./migrations")]
async fn link_device_for_unknown_phone_is_not_found(pool: PgPool) {
    let result = clock_service::link_device(&pool, "555-9999", "dev-1").await;
    assert_matches!(result, Err(AppError::WorkerNotFound));
}

#[sqlx::test(migrations = "./migrations")]
async fn jane_doe_scenario(pool: PgPool) {
    register_jane(&pool).await;

    let t1 = t(7, 0);
    let entry = clock_service::clock_in(&pool, PHONE, "dev-1", 40.005, -75.005, "Alpha Yard", t1)
        .await
        .unwrap();
    assert_eq!(entry.clock_in, t1);
    assert_eq!(entry.site_name, "Alpha Yard");
    assert_eq!(entry.subcontractor, "Acme");
    assert_eq!(entry.employee_name, "Jane Doe");
    assert!(entry.clock_out.is_none());

    let t2 = t(7, 5);
    let again = clock_service::clock_in(&pool, PHONE, "dev-1", 40.005, -75.005, "Alpha Yard", t2).await;
    assert_matches!(again, Err(AppError::AlreadyClockedIn));

    // The refused clock-in changed nothing
    let open = clock_service::current_session(&pool, PHONE).await.unwrap().unwrap();
    assert_eq!(open.id, entry.id);
    assert_eq!(open.clock_in, t1);
    assert_eq!(open_entries(&pool, PHONE).await, 1);

    let t3 = t(15, 30);
    let closed = clock_service::clock_out(&pool, PHONE, t3).await.unwrap();
    assert_eq!(closed.id, entry.id);
    assert_eq!(closed.clock_out, Some(t3));
    assert!(closed.clock_out.unwrap() >= closed.clock_in);
    assert_eq!(closed.worked_duration(), Some(Duration::minutes(510)));

    assert!(clock_service::current_session(&pool, PHONE).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn clock_in_requires_registration(pool: PgPool) {
    let result =
        clock_service::clock_in(&pool, PHONE, "dev-1", 40.005, -75.005, "Alpha Yard", t(7, 0)).await;
    assert_matches!(result, Err(AppError::WorkerNotFound));
    assert_eq!(open_entries(&pool, PHONE).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn clock_out_without_session_is_refused(pool: PgPool) {
    register_jane(&pool).await;

    let result = clock_service::clock_out(&pool, PHONE, t(15, 0)).await;
    assert_matches!(result, Err(AppError::NoOpenSession));
}

#[sqlx::test(migrations = "./migrations")]
async fn clock_out_before_clock_in_is_invalid(pool: PgPool) {
    register_jane(&pool).await;
    clock_service::clock_in(&pool, PHONE, "dev-1", 40.005, -75.005, "Alpha Yard", t(7, 0))
        .await
        .unwrap();

    let result = clock_service::clock_out(&pool, PHONE, t(6, 0)).await;
    assert_matches!(result, Err(AppError::InvalidInput(_)));

    // Session stays open
    assert_eq!(open_entries(&pool, PHONE).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn clock_in_again_after_clock_out(pool: PgPool) {
    register_jane(&pool).await;

    clock_service::clock_in(&pool, PHONE, "dev-1", 40.005, -75.005, "Alpha Yard", t(7, 0))
        .await
        .unwrap();
    clock_service::clock_out(&pool, PHONE, t(11, 0)).await.unwrap();
    let second = clock_service::clock_in(&pool, PHONE, "dev-1", 40.005, -75.005, "Alpha Yard", t(12, 0))
        .await
        .unwrap();

    let history = clock_service::list_entries(&pool, PHONE, None).await.unwrap();
    assert_eq!(history.len(), 2);
    // Newest first
    assert_eq!(history[0].id, second.id);
    assert!(history[0].is_open());
    assert!(!history[1].is_open());

    let limited = clock_service::list_entries(&pool, PHONE, Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_clock_ins_open_one_session(pool: PgPool) {
    register_jane(&pool).await;

    let attempts = (0..8).map(|i| {
        let pool = pool.clone();
        tokio::spawn(async move {
            clock_service::clock_in(
                &pool,
                PHONE,
                "dev-1",
                40.005,
                -75.005,
                "Alpha Yard",
                t(7, 0) + Duration::seconds(i),
            )
            .await
        })
    });

    let mut succeeded = 0;
    for handle in attempts.collect::<Vec<_>>() {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert_matches!(err, AppError::AlreadyClockedIn),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(open_entries(&pool, PHONE).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn worker_status_walks_the_state_machine(pool: PgPool) {
    let status = clock_service::worker_status(&pool, PHONE).await.unwrap();
    assert_eq!(status.state, ClockState::Unregistered);
    assert!(status.worker.is_none());

    register_jane(&pool).await;
    let status = clock_service::worker_status(&pool, PHONE).await.unwrap();
    assert_eq!(status.state, ClockState::ClockedOut);

    clock_service::clock_in(&pool, PHONE, "dev-1", 40.005, -75.005, "Alpha Yard", t(7, 0))
        .await
        .unwrap();
    let status = clock_service::worker_status(&pool, PHONE).await.unwrap();
    assert_eq!(status.state, ClockState::ClockedIn);
    assert!(status.open_session.is_some());

    clock_service::clock_out(&pool, PHONE, t(8, 0)).await.unwrap();
    let status = clock_service::worker_status(&pool, PHONE).await.unwrap();
    assert_eq!(status.state, ClockState::ClockedOut);
    assert!(status.open_session.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn bound_worker_follows_the_device_binding(pool: PgPool) {
    register_jane(&pool).await;

    let worker = clock_service::bound_worker(&pool, "dev-1", None).await.unwrap();
    assert_eq!(worker.phone_number, PHONE);

    let claimed = clock_service::bound_worker(&pool, "dev-1", Some(PHONE)).await.unwrap();
    assert_eq!(claimed.id, worker.id);

    assert_matches!(
        clock_service::bound_worker(&pool, "dev-stranger", Some(PHONE)).await,
        Err(AppError::WorkerNotFound)
    );
    assert_matches!(
        clock_service::bound_worker(&pool, "dev-1", Some("555-0101")).await,
        Err(AppError::DeviceMismatch)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn relinked_device_loses_clock_rights(pool: PgPool) {
    register_jane(&pool).await;
    clock_service::link_device(&pool, PHONE, "dev-2").await.unwrap();

    assert_matches!(
        clock_service::bound_worker(&pool, "dev-1", None).await,
        Err(AppError::WorkerNotFound)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn identify_walks_register_link_recognize(pool: PgPool) {
    let (outcome, registered) =
        clock_service::identify(&pool, "dev-1", Some(PHONE), Some("Acme"), Some("Jane Doe"))
            .await
            .unwrap();
    assert_eq!(outcome, IdentifyOutcome::Registered);
    assert_eq!(registered.subcontractor, "Acme");
    assert_eq!(registered.device_token.as_deref(), Some("dev-1"));

    let (outcome, recognized) = clock_service::identify(&pool, "dev-1", None, None, None)
        .await
        .unwrap();
    assert_eq!(outcome, IdentifyOutcome::Recognized);
    assert_eq!(recognized.id, registered.id);

    let (outcome, linked) = clock_service::identify(&pool, "dev-2", Some(PHONE), None, None)
        .await
        .unwrap();
    assert_eq!(outcome, IdentifyOutcome::Linked);
    assert_eq!(linked.id, registered.id);
    assert_eq!(linked.device_token.as_deref(), Some("dev-2"));
}

#[sqlx::test(migrations = "./migrations")]
async fn identify_needs_name_and_subcontractor_for_new_phone(pool: PgPool) {
    assert_matches!(
        clock_service::identify(&pool, "dev-1", None, Some("Acme"), None).await,
        Err(AppError::InvalidInput(msg)) if msg == "phone_number is required"
    );
    assert_matches!(
        clock_service::identify(&pool, "dev-1", Some(PHONE), None, Some("Jane Doe")).await,
        Err(AppError::InvalidInput(msg)) if msg == "subcontractor is required"
    );
    assert_matches!(
        clock_service::identify(&pool, "dev-1", Some(PHONE), Some("Acme"), Some("  ")).await,
        Err(AppError::InvalidInput(msg)) if msg == "employee_name is required"
    );
    assert!(clock_service::find_by_phone(&pool, PHONE).await.unwrap().is_none());
}
