//! PostgreSQLストアの結合テスト
//!
//! DATABASE_URLの指すデータベースが必要なため、既定では実行しない。
//! `cargo test -- --ignored` で実行する。

mod common;

use atelier_loans::adapters::postgres::postgres_dependencies;
use atelier_loans::application::booking::{self, BookingError};
use atelier_loans::application::{ErrorKind, account, inventory};
use atelier_loans::domain::{
    AuthorizationScope, BookingEvent, EquipmentDraft, EquipmentId, PersonDraft, Role,
    commands::{AcceptReservation, RequestReservation, ReturnLoan},
};
use atelier_loans::ports::StoreError;
use chrono::{TimeZone, Utc};
use common::{Fixture, booking_clock, march};
use serial_test::serial;
use sqlx::PgPool;

/// すべてのテーブルを空にする
async fn cleanup_database(pool: &PgPool) {
    sqlx::query(
        "TRUNCATE TABLE sessions, booking_events, loans, reservations, atelier_persons, \
         equipment, equipment_types, ateliers, persons RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await
    .expect("Failed to truncate tables");
}

async fn postgres_fixture() -> Fixture {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;
    common::seed(postgres_dependencies(pool, AuthorizationScope::AnyAtelier)).await
}

fn request(f: &Fixture, start_day: u32, end_day: u32) -> RequestReservation {
    RequestReservation {
        equipment_id: f.equipment.equipment_id,
        start: march(start_day, 0),
        end: march(end_day, 0),
        requested_at: booking_clock(),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_reserve_accept_return() {
    let f = postgres_fixture().await;

    let reservation = booking::request_reservation(&f.deps, &f.student_a, request(&f, 1, 3))
        .await
        .expect("Failed to create reservation");

    let err = booking::request_reservation(&f.deps, &f.student_b, request(&f, 2, 4))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let loan = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        AcceptReservation {
            reservation_id: reservation.reservation_id,
            accepted_at: march(1, 9),
        },
    )
    .await
    .expect("Failed to accept reservation");
    assert_eq!(loan.window.start(), march(1, 9));
    assert_eq!(loan.window.end(), march(3, 0));
    assert_eq!(loan.atelier_id, f.atelier.atelier_id);

    assert!(
        f.deps
            .booking_store
            .get_reservation(reservation.reservation_id)
            .await
            .unwrap()
            .is_none()
    );

    // 貸出の終了に隣接する予約
    booking::request_reservation(&f.deps, &f.student_b, request(&f, 3, 5))
        .await
        .expect("Adjacent reservation should be accepted");

    booking::return_loan(
        &f.deps,
        &f.teacher,
        ReturnLoan {
            loan_id: loan.loan_id,
            returned_at: march(2, 12),
        },
    )
    .await
    .expect("Failed to return loan");

    let history = booking::equipment_history(&f.deps, f.equipment.equipment_id)
        .await
        .unwrap();
    let types: Vec<&str> = history.iter().map(BookingEvent::event_type).collect();
    assert_eq!(
        types,
        vec![
            "ReservationRequested",
            "ReservationAccepted",
            "ReservationRequested",
            "LoanReturned"
        ]
    );
}

/// アプリケーション層のロックを経由しない書き込みも、ストアが重複を拒否する
#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_store_rejects_overlap_directly() {
    let f = postgres_fixture().await;

    let first = atelier_loans::domain::ReservationDraft {
        equipment_id: f.equipment.equipment_id,
        person_id: f.student_a.person_id,
        window: atelier_loans::domain::TimeWindow::new(march(10, 0), march(12, 0)).unwrap(),
        created_at: booking_clock(),
    };
    let mut second = first.clone();
    second.person_id = f.student_b.person_id;
    second.window = atelier_loans::domain::TimeWindow::new(march(11, 0), march(13, 0)).unwrap();

    f.deps.booking_store.insert_reservation(first).await.unwrap();
    let err = f
        .deps
        .booking_store
        .insert_reservation(second)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Overlap(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_concurrent_requests_admit_one() {
    let f = postgres_fixture().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let deps = f.deps.clone();
        let caller = if i % 2 == 0 {
            f.student_a.clone()
        } else {
            f.student_b.clone()
        };
        let cmd = request(&f, 20, 22);
        handles.push(tokio::spawn(async move {
            booking::request_reservation(&deps, &caller, cmd).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_duplicate_email_and_unknown_role() {
    let f = postgres_fixture().await;

    let err = f
        .deps
        .person_store
        .insert_person(PersonDraft {
            first_name: "Alice".to_string(),
            surname: "Again".to_string(),
            email: "alice@school.example".to_string(),
            role: Some(Role::User),
            password_hash: "x".to_string(),
            created_at: booking_clock(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateEmail));

    // 未知のロール文字列はロールなしとして読み戻す
    let pool = common::create_test_pool().await;
    sqlx::query("UPDATE persons SET role = 'janitor' WHERE person_id = $1")
        .bind(f.student_b.person_id.value())
        .execute(&pool)
        .await
        .unwrap();

    let person = f
        .deps
        .person_store
        .get_person(f.student_b.person_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(person.role, None);

    let grant = account::login(&f.deps, "bob@school.example", "password", booking_clock())
        .await
        .unwrap();
    assert!(matches!(
        account::resolve_caller(&f.deps, grant.token, booking_clock()).await,
        Err(account::AccountError::Unauthenticated)
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_cascades() {
    let f = postgres_fixture().await;

    booking::request_reservation(&f.deps, &f.student_a, request(&f, 1, 2))
        .await
        .unwrap();
    booking::request_reservation(&f.deps, &f.student_b, request(&f, 3, 4))
        .await
        .unwrap();

    inventory::remove_member(
        &f.deps,
        &f.admin,
        f.atelier.atelier_id,
        f.student_a.person_id,
        booking_clock(),
    )
    .await
    .unwrap();
    let remaining = f.deps.booking_store.all_reservations().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].person_id, f.student_b.person_id);

    let history = booking::equipment_history(&f.deps, f.equipment.equipment_id)
        .await
        .unwrap();
    let types: Vec<&str> = history.iter().map(BookingEvent::event_type).collect();
    assert_eq!(
        types,
        vec![
            "ReservationRequested",
            "ReservationRequested",
            "ReservationCancelled"
        ]
    );

    inventory::delete_atelier(&f.deps, &f.admin, f.atelier.atelier_id)
        .await
        .unwrap();
    assert!(f.deps.booking_store.all_reservations().await.unwrap().is_empty());
    assert!(matches!(
        booking::request_reservation(&f.deps, &f.student_b, request(&f, 5, 6)).await,
        Err(BookingError::EquipmentNotFound)
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_expired_sessions_are_rejected_and_purged() {
    let f = postgres_fixture().await;
    let long_ago = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();

    let stale = account::login(&f.deps, "alice@school.example", "password", long_ago)
        .await
        .unwrap();
    assert!(matches!(
        account::resolve_caller(&f.deps, stale.token, booking_clock()).await,
        Err(account::AccountError::Unauthenticated)
    ));

    // 次のログインで期限切れの行が消える
    account::login(&f.deps, "bob@school.example", "password", booking_clock())
        .await
        .unwrap();
    let pool = common::create_test_pool().await;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE token = $1")
        .bind(stale.token.value())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_postgres_profile_and_inventory_edits() {
    let f = postgres_fixture().await;

    let err = f
        .deps
        .person_store
        .update_profile(f.student_a.person_id, "Alice", "Tester", "bob@school.example")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateEmail));

    let person = f
        .deps
        .person_store
        .update_profile(f.student_a.person_id, "Alicia", "Tester", "alicia@school.example")
        .await
        .unwrap();
    assert_eq!(person.email, "alicia@school.example");

    let atelier = f
        .deps
        .inventory_store
        .rename_atelier(f.atelier.atelier_id, "Etching")
        .await
        .unwrap();
    assert_eq!(atelier.name, "Etching");

    let mut draft = EquipmentDraft {
        name: "Etching press (large)".to_string(),
        atelier_id: f.atelier.atelier_id,
        type_id: f.equipment.type_id,
        manufacture_date: f.equipment.manufacture_date,
        purchase_date: f.equipment.purchase_date,
        max_loan_duration_days: 2,
    };
    let equipment = f
        .deps
        .inventory_store
        .update_equipment(f.equipment.equipment_id, draft.clone())
        .await
        .unwrap();
    assert_eq!(equipment.max_loan_duration_days, 2);

    draft.name = "Gone".to_string();
    assert!(matches!(
        f.deps
            .inventory_store
            .update_equipment(EquipmentId::from_i64(9_999), draft)
            .await,
        Err(StoreError::NotFound)
    ));
}
