use atelier_loans::application::ErrorKind;
use atelier_loans::application::booking::{self, BookingError};
use atelier_loans::application::inventory;
use atelier_loans::domain::{
    AuthorizationScope, BookingConflict, BookingEvent, Caller, EquipmentId, LoanStatus,
    Reservation, ReservationId,
    commands::{AcceptReservation, CancelReservation, RequestReservation, ReturnLoan},
};
use chrono::{DateTime, Utc};

mod common;
use common::{Fixture, booking_clock, march, memory_fixture};

// ============================================================================
// ヘルパー
// ============================================================================

fn request(
    equipment_id: EquipmentId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> RequestReservation {
    RequestReservation {
        equipment_id,
        start,
        end,
        requested_at: booking_clock(),
    }
}

async fn reserve(
    fixture: &Fixture,
    caller: &Caller,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Reservation, BookingError> {
    booking::request_reservation(
        &fixture.deps,
        caller,
        request(fixture.equipment.equipment_id, start, end),
    )
    .await
}

fn accept(reservation_id: ReservationId, accepted_at: DateTime<Utc>) -> AcceptReservation {
    AcceptReservation {
        reservation_id,
        accepted_at,
    }
}

// ============================================================================
// 予約申請
// ============================================================================

/// 予約 → 重複は拒否 → 承認で貸出に変換 → 貸出の終了に隣接する予約は成功
#[tokio::test]
async fn test_reserve_accept_then_adjacent_reservation() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;

    // A: [03-01, 03-03)
    let reservation_a = reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();
    assert_eq!(reservation_a.person_id, f.student_a.person_id);

    // B: [03-02, 03-04) は A と重なる
    let result = reserve(&f, &f.student_b, march(2, 0), march(4, 0)).await;
    assert!(matches!(
        result,
        Err(BookingError::ReservationConflict(BookingConflict::Reservation(id)))
            if id == reservation_a.reservation_id
    ));

    // A を 03-01 09:00 に承認
    let loan = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(reservation_a.reservation_id, march(1, 9)),
    )
    .await
    .unwrap();

    assert_eq!(loan.person_id, f.student_a.person_id);
    assert_eq!(loan.equipment_id, f.equipment.equipment_id);
    assert_eq!(loan.atelier_id, f.atelier.atelier_id);
    assert_eq!(loan.window.start(), march(1, 9));
    assert_eq!(loan.window.end(), march(3, 0));
    assert_eq!(loan.status, LoanStatus::Active);

    // 予約は消え、貸出が1件だけ存在する
    let store = &f.deps.booking_store;
    assert!(
        store
            .get_reservation(reservation_a.reservation_id)
            .await
            .unwrap()
            .is_none()
    );
    let loans = store
        .loans_for_equipment(f.equipment.equipment_id)
        .await
        .unwrap();
    assert_eq!(loans, vec![loan.clone()]);

    // B: [03-03, 03-05) は貸出の終了に隣接するだけなので成功
    let reservation_b = reserve(&f, &f.student_b, march(3, 0), march(5, 0))
        .await
        .unwrap();
    assert_eq!(reservation_b.window.start(), loan.window.end());
}

#[tokio::test]
async fn test_touching_reservations_do_not_conflict() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;

    reserve(&f, &f.student_a, march(10, 9), march(11, 9))
        .await
        .unwrap();
    reserve(&f, &f.student_b, march(11, 9), march(12, 9))
        .await
        .unwrap();
    reserve(&f, &f.student_b, march(9, 9), march(10, 9))
        .await
        .unwrap();

    let reservations = f
        .deps
        .booking_store
        .reservations_for_equipment(f.equipment.equipment_id)
        .await
        .unwrap();
    assert_eq!(reservations.len(), 3);
}

#[tokio::test]
async fn test_overlap_with_loan_is_reported_as_loan_conflict() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;

    let reservation = reserve(&f, &f.student_a, march(5, 0), march(7, 0))
        .await
        .unwrap();
    let loan = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(reservation.reservation_id, march(5, 8)),
    )
    .await
    .unwrap();

    let result = reserve(&f, &f.student_b, march(6, 0), march(8, 0)).await;
    match result {
        Err(err @ BookingError::LoanConflict(BookingConflict::Loan(id))) => {
            assert_eq!(id, loan.loan_id);
            assert_eq!(err.kind(), ErrorKind::Conflict);
        }
        other => panic!("expected loan conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_start_in_the_past_is_a_policy_violation() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;

    let mut cmd = request(f.equipment.equipment_id, march(1, 0), march(2, 0));
    cmd.requested_at = march(1, 1);

    let err = booking::request_reservation(&f.deps, &f.student_a, cmd)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::StartInPast));
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
}

#[tokio::test]
async fn test_duration_is_counted_in_whole_days() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;

    // 5日と2時間 → 5日（切り捨て）なので上限5日に収まる
    reserve(&f, &f.student_a, march(1, 10), march(6, 12))
        .await
        .unwrap();

    // 6日ちょうどは超過
    let err = reserve(&f, &f.student_b, march(10, 0), march(16, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::DurationExceeded {
            max_days: 5,
            requested_days: 6
        }
    ));
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
}

#[tokio::test]
async fn test_conflict_is_checked_before_time_policies() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;

    reserve(&f, &f.student_a, march(10, 0), march(12, 0))
        .await
        .unwrap();

    // 重複しており、かつ期間も超過している → 重複が先に報告される
    let err = reserve(&f, &f.student_b, march(11, 0), march(25, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ReservationConflict(_)));
}

#[tokio::test]
async fn test_unknown_equipment_and_empty_window() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;

    let err = booking::request_reservation(
        &f.deps,
        &f.student_a,
        request(EquipmentId::from_i64(9_999), march(1, 0), march(2, 0)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::EquipmentNotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = reserve(&f, &f.student_a, march(2, 0), march(2, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidWindow));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

/// 同じ時間帯への同時申請は1件だけ成功する
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_requests_admit_exactly_one() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let deps = f.deps.clone();
        let caller = if i % 2 == 0 {
            f.student_a.clone()
        } else {
            f.student_b.clone()
        };
        let cmd = request(
            f.equipment.equipment_id,
            march(20, i % 3),
            march(22, i % 3),
        );
        handles.push(tokio::spawn(async move {
            booking::request_reservation(&deps, &caller, cmd).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
        }
    }

    assert_eq!(successes, 1);
    let reservations = f
        .deps
        .booking_store
        .reservations_for_equipment(f.equipment.equipment_id)
        .await
        .unwrap();
    assert_eq!(reservations.len(), 1);
}

// ============================================================================
// 空き状況
// ============================================================================

#[tokio::test]
async fn test_is_available_uses_half_open_windows() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let id = f.equipment.equipment_id;

    assert!(booking::is_available(&f.deps, id, march(1, 0), march(3, 0)).await.unwrap());

    reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();

    assert!(!booking::is_available(&f.deps, id, march(2, 0), march(4, 0)).await.unwrap());
    assert!(booking::is_available(&f.deps, id, march(3, 0), march(4, 0)).await.unwrap());
    assert!(booking::is_available(&f.deps, id, march(1, 0) - chrono::Duration::days(1), march(1, 0)).await.unwrap());

    let err = booking::is_available(&f.deps, EquipmentId::from_i64(9_999), march(1, 0), march(2, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::EquipmentNotFound));
}

// ============================================================================
// 承認
// ============================================================================

#[tokio::test]
async fn test_accepting_unknown_reservation_changes_nothing() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();

    let err = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(ReservationId::from_i64(9_999), march(1, 9)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::ReservationNotFound));

    let store = &f.deps.booking_store;
    assert_eq!(store.all_reservations().await.unwrap().len(), 1);
    assert!(store.all_loans().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_students_cannot_accept_reservations() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let reservation = reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();

    let err = booking::accept_reservation(
        &f.deps,
        &f.student_a,
        accept(reservation.reservation_id, march(1, 9)),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_own_ateliers_scope_limits_staff_to_their_ateliers() {
    let f = memory_fixture(AuthorizationScope::OwnAteliers).await;
    let reservation = reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();

    let err = booking::accept_reservation(
        &f.deps,
        &f.outside_teacher,
        accept(reservation.reservation_id, march(1, 9)),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // 所属アトリエの教員なら承認できる
    booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(reservation.reservation_id, march(1, 9)),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_any_atelier_scope_lets_any_staff_accept() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let reservation = reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();

    booking::accept_reservation(
        &f.deps,
        &f.outside_teacher,
        accept(reservation.reservation_id, march(1, 9)),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_accepting_after_reservation_end_is_rejected() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let reservation = reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();

    let err = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(reservation.reservation_id, march(3, 0)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::ReservationElapsed));
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);

    // 予約はそのまま残る
    assert!(
        f.deps
            .booking_store
            .get_reservation(reservation.reservation_id)
            .await
            .unwrap()
            .is_some()
    );
}

/// 早めの承認で貸出期間が前倒しになり、先行する予約と重なる場合は拒否
#[tokio::test]
async fn test_early_acceptance_cannot_swallow_an_earlier_reservation() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let earlier = reserve(&f, &f.student_b, march(2, 0), march(3, 0))
        .await
        .unwrap();
    let later = reserve(&f, &f.student_a, march(3, 0), march(5, 0))
        .await
        .unwrap();

    let err = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(later.reservation_id, march(1, 12)),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        BookingError::AcceptanceBlocked(BookingConflict::Reservation(id))
            if id == earlier.reservation_id
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

/// 先の予約が残っている間は、後の予約を承認できない（前の予約が片付けば承認できる）
#[tokio::test]
async fn test_acceptance_waits_for_the_earlier_booking() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let earlier = reserve(&f, &f.student_b, march(5, 0), march(7, 0))
        .await
        .unwrap();
    let later = reserve(&f, &f.student_a, march(10, 0), march(12, 0))
        .await
        .unwrap();

    let err = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(later.reservation_id, march(1, 0)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::AcceptanceBlocked(_)));
    assert!(err.to_string().contains("earlier booking"));

    // 予約は残ったまま
    let pending = f.deps.booking_store.all_reservations().await.unwrap();
    assert_eq!(pending.len(), 2);

    booking::cancel_reservation(
        &f.deps,
        &f.student_b,
        CancelReservation {
            reservation_id: earlier.reservation_id,
            cancelled_at: march(1, 0),
        },
    )
    .await
    .unwrap();

    let loan = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(later.reservation_id, march(1, 0)),
    )
    .await
    .unwrap();
    assert_eq!(loan.window.start(), march(1, 0));
    assert_eq!(loan.window.end(), march(12, 0));
}

// ============================================================================
// 取消・返却
// ============================================================================

#[tokio::test]
async fn test_cancel_by_owner_or_staff_only() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let first = reserve(&f, &f.student_a, march(1, 0), march(2, 0))
        .await
        .unwrap();
    let second = reserve(&f, &f.student_a, march(4, 0), march(5, 0))
        .await
        .unwrap();

    let cancel = |reservation_id| CancelReservation {
        reservation_id,
        cancelled_at: booking_clock(),
    };

    // 他人の予約は取り消せない
    let err = booking::cancel_reservation(&f.deps, &f.student_b, cancel(first.reservation_id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // 本人は取り消せる
    booking::cancel_reservation(&f.deps, &f.student_a, cancel(first.reservation_id))
        .await
        .unwrap();

    // 職員も取り消せる
    booking::cancel_reservation(&f.deps, &f.teacher, cancel(second.reservation_id))
        .await
        .unwrap();

    // 二度目は NotFound
    let err = booking::cancel_reservation(&f.deps, &f.student_a, cancel(first.reservation_id))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ReservationNotFound));

    assert!(f.deps.booking_store.all_reservations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_return_removes_the_loan_once() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let reservation = reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();
    let loan = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(reservation.reservation_id, march(1, 9)),
    )
    .await
    .unwrap();

    let cmd = ReturnLoan {
        loan_id: loan.loan_id,
        returned_at: march(2, 15),
    };

    let err = booking::return_loan(&f.deps, &f.student_a, cmd.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    booking::return_loan(&f.deps, &f.teacher, cmd.clone())
        .await
        .unwrap();
    assert!(f.deps.booking_store.all_loans().await.unwrap().is_empty());

    let err = booking::return_loan(&f.deps, &f.teacher, cmd)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::LoanNotFound));

    // 返却後は同じ時間帯を再び予約できる
    reserve(&f, &f.student_b, march(2, 0), march(3, 0))
        .await
        .unwrap();
}

// ============================================================================
// 履歴・連鎖削除
// ============================================================================

#[tokio::test]
async fn test_history_records_every_transition_in_order() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let reservation = reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();
    let loan = booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(reservation.reservation_id, march(1, 9)),
    )
    .await
    .unwrap();
    booking::return_loan(
        &f.deps,
        &f.teacher,
        ReturnLoan {
            loan_id: loan.loan_id,
            returned_at: march(2, 17),
        },
    )
    .await
    .unwrap();

    let history = booking::equipment_history(&f.deps, f.equipment.equipment_id)
        .await
        .unwrap();
    let types: Vec<&str> = history.iter().map(BookingEvent::event_type).collect();
    assert_eq!(
        types,
        vec!["ReservationRequested", "ReservationAccepted", "LoanReturned"]
    );

    match &history[1] {
        BookingEvent::ReservationAccepted(e) => {
            assert_eq!(e.reservation_id, reservation.reservation_id);
            assert_eq!(e.loan_id, loan.loan_id);
            assert_eq!(e.accepted_by, f.teacher.person_id);
            assert_eq!(e.accepted_at, march(1, 9));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_removing_a_member_drops_their_reservations_in_that_atelier() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let dropped = reserve(&f, &f.student_a, march(1, 0), march(2, 0))
        .await
        .unwrap();
    let kept = reserve(&f, &f.student_b, march(3, 0), march(4, 0))
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
    assert_eq!(remaining, vec![kept]);

    // 取り消された予約は、外した職員の名義で履歴に残る
    let history = booking::equipment_history(&f.deps, f.equipment.equipment_id)
        .await
        .unwrap();
    let cancellations: Vec<_> = history
        .iter()
        .filter_map(|event| match event {
            BookingEvent::ReservationCancelled(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(cancellations.len(), 1);
    assert_eq!(cancellations[0].reservation_id, dropped.reservation_id);
    assert_eq!(cancellations[0].person_id, f.student_a.person_id);
    assert_eq!(cancellations[0].cancelled_by, f.admin.person_id);
}

#[tokio::test]
async fn test_deleting_equipment_cascades_to_bookings() {
    let f = memory_fixture(AuthorizationScope::AnyAtelier).await;
    let reservation = reserve(&f, &f.student_a, march(1, 0), march(3, 0))
        .await
        .unwrap();
    booking::accept_reservation(
        &f.deps,
        &f.teacher,
        accept(reservation.reservation_id, march(1, 9)),
    )
    .await
    .unwrap();
    reserve(&f, &f.student_b, march(4, 0), march(5, 0))
        .await
        .unwrap();

    inventory::delete_equipment(&f.deps, &f.admin, f.equipment.equipment_id)
        .await
        .unwrap();

    let store = &f.deps.booking_store;
    assert!(store.all_reservations().await.unwrap().is_empty());
    assert!(store.all_loans().await.unwrap().is_empty());

    let err = reserve(&f, &f.student_b, march(6, 0), march(7, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::EquipmentNotFound));
}
