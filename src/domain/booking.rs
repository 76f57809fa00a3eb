use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::availability::check_availability;
use super::{
    AcceptReservationError, AtelierId, Equipment, EquipmentId, LoanId, PersonId,
    RequestReservationError, ReservationId, TimeWindow,
};

/// 貸出ステータス
///
/// 貸出ライフサイクルが付与するのは`Active`のみ。
/// 返却は行の削除で表現するため、`Overdue`・`Returned`は読み戻し用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Overdue,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LoanStatus::Active),
            "overdue" => Ok(LoanStatus::Overdue),
            "returned" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// 予約 - 承認待ちの貸出申請
///
/// 状態フィールドは持たない。予約テーブルに行があること自体が
/// 「申請中」を意味し、承認（貸出へ変換）か取消で行が消える。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub equipment_id: EquipmentId,
    pub person_id: PersonId,
    pub window: TimeWindow,
    pub created_at: DateTime<Utc>,
}

/// 採番前の予約
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub equipment_id: EquipmentId,
    pub person_id: PersonId,
    pub window: TimeWindow,
    pub created_at: DateTime<Utc>,
}

/// 貸出 - 承認済みで利用中の機材
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub equipment_id: EquipmentId,
    pub person_id: PersonId,
    pub atelier_id: AtelierId,
    pub window: TimeWindow,
    pub status: LoanStatus,
}

/// 採番前の貸出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanDraft {
    pub equipment_id: EquipmentId,
    pub person_id: PersonId,
    pub atelier_id: AtelierId,
    pub window: TimeWindow,
    pub status: LoanStatus,
}

/// 純粋関数：予約を申請する
///
/// ビジネスルール（この順に判定する）：
/// 1. 既存の予約と重ならないこと
/// 2. 既存の貸出と重ならないこと
/// 3. 開始が過去でないこと
/// 4. 期間（日数、切り捨て）が機材の最大貸出日数以下であること
///
/// 機材の存在確認はアプリケーション層で行う。
/// 副作用なし。採番前の予約を返す。
pub fn request_reservation(
    equipment: &Equipment,
    person_id: PersonId,
    window: TimeWindow,
    reservations: &[Reservation],
    loans: &[Loan],
    requested_at: DateTime<Utc>,
) -> Result<ReservationDraft, RequestReservationError> {
    check_availability(&window, reservations, loans, None)?;

    if window.start() < requested_at {
        return Err(RequestReservationError::StartInPast);
    }

    let requested_days = window.whole_days();
    if requested_days > i64::from(equipment.max_loan_duration_days) {
        return Err(RequestReservationError::DurationExceeded {
            max_days: equipment.max_loan_duration_days,
            requested_days,
        });
    }

    Ok(ReservationDraft {
        equipment_id: equipment.equipment_id,
        person_id,
        window,
        created_at: requested_at,
    })
}

/// 純粋関数：予約を承認し、貸出に変換する
///
/// ビジネスルール：
/// - 貸出開始は承認時刻（予約の開始時刻ではない）
/// - 貸出終了は予約の終了時刻
/// - アトリエは機材の所属アトリエ
/// - 承認時刻が予約終了以降なら承認できない
/// - 承認で前倒しになった区間も、他の予約・貸出と重なってはならない
///
/// 副作用なし。採番前の貸出を返す。
pub fn accept_reservation(
    reservation: &Reservation,
    equipment: &Equipment,
    reservations: &[Reservation],
    loans: &[Loan],
    accepted_at: DateTime<Utc>,
) -> Result<LoanDraft, AcceptReservationError> {
    let window = TimeWindow::new(accepted_at, reservation.window.end())
        .map_err(|_| AcceptReservationError::ReservationElapsed)?;

    check_availability(&window, reservations, loans, Some(reservation.reservation_id))?;

    Ok(LoanDraft {
        equipment_id: reservation.equipment_id,
        person_id: reservation.person_id,
        atelier_id: equipment.atelier_id,
        window,
        status: LoanStatus::Active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookingConflict, EquipmentTypeId};
    use chrono::{NaiveDate, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeWindow {
        TimeWindow::new(start, end).unwrap()
    }

    fn equipment(max_days: i32) -> Equipment {
        Equipment {
            equipment_id: EquipmentId::from_i64(1),
            name: "Hasselblad 500C".to_string(),
            atelier_id: AtelierId::from_i64(3),
            type_id: EquipmentTypeId::from_i64(1),
            manufacture_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            purchase_date: NaiveDate::from_ymd_opt(2012, 1, 1).unwrap(),
            max_loan_duration_days: max_days,
        }
    }

    fn reservation(id: i64, person: i64, w: TimeWindow) -> Reservation {
        Reservation {
            reservation_id: ReservationId::from_i64(id),
            equipment_id: EquipmentId::from_i64(1),
            person_id: PersonId::from_i64(person),
            window: w,
            created_at: at(1, 0),
        }
    }

    fn loan(id: i64, w: TimeWindow) -> Loan {
        Loan {
            loan_id: LoanId::from_i64(id),
            equipment_id: EquipmentId::from_i64(1),
            person_id: PersonId::from_i64(9),
            atelier_id: AtelierId::from_i64(3),
            window: w,
            status: LoanStatus::Active,
        }
    }

    #[test]
    fn test_request_reservation_success() {
        let requested_at = at(1, 0);
        let w = window(at(1, 0), at(3, 0));

        let draft =
            request_reservation(&equipment(5), PersonId::from_i64(2), w, &[], &[], requested_at)
                .unwrap();

        assert_eq!(draft.equipment_id, EquipmentId::from_i64(1));
        assert_eq!(draft.person_id, PersonId::from_i64(2));
        assert_eq!(draft.window, w);
        assert_eq!(draft.created_at, requested_at);
    }

    #[test]
    fn test_request_reservation_conflicts_with_reservation() {
        let existing = reservation(10, 1, window(at(1, 0), at(3, 0)));
        let result = request_reservation(
            &equipment(5),
            PersonId::from_i64(2),
            window(at(2, 0), at(4, 0)),
            &[existing],
            &[],
            at(1, 0),
        );
        assert_eq!(
            result.unwrap_err(),
            RequestReservationError::Conflict(BookingConflict::Reservation(
                ReservationId::from_i64(10)
            ))
        );
    }

    #[test]
    fn test_request_reservation_conflicts_with_loan() {
        let existing = loan(4, window(at(1, 0), at(3, 0)));
        let result = request_reservation(
            &equipment(5),
            PersonId::from_i64(2),
            window(at(2, 0), at(4, 0)),
            &[],
            &[existing],
            at(1, 0),
        );
        assert_eq!(
            result.unwrap_err(),
            RequestReservationError::Conflict(BookingConflict::Loan(LoanId::from_i64(4)))
        );
    }

    #[test]
    fn test_request_reservation_conflict_reported_before_past_start() {
        // 重複と過去開始が両方ある場合は重複が優先される
        let existing = reservation(10, 1, window(at(1, 0), at(3, 0)));
        let result = request_reservation(
            &equipment(5),
            PersonId::from_i64(2),
            window(at(1, 0), at(2, 0)),
            &[existing],
            &[],
            at(5, 0),
        );
        assert!(matches!(
            result.unwrap_err(),
            RequestReservationError::Conflict(_)
        ));
    }

    #[test]
    fn test_request_reservation_rejects_past_start() {
        let result = request_reservation(
            &equipment(5),
            PersonId::from_i64(2),
            window(at(1, 0), at(2, 0)),
            &[],
            &[],
            at(1, 1),
        );
        assert_eq!(result.unwrap_err(), RequestReservationError::StartInPast);
    }

    #[test]
    fn test_request_reservation_start_equal_to_now_is_allowed() {
        let now = at(1, 0);
        let result = request_reservation(
            &equipment(5),
            PersonId::from_i64(2),
            window(now, at(2, 0)),
            &[],
            &[],
            now,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_request_reservation_rejects_duration_over_limit() {
        let result = request_reservation(
            &equipment(5),
            PersonId::from_i64(2),
            window(at(1, 0), at(7, 0)),
            &[],
            &[],
            at(1, 0),
        );
        assert_eq!(
            result.unwrap_err(),
            RequestReservationError::DurationExceeded {
                max_days: 5,
                requested_days: 6
            }
        );
    }

    #[test]
    fn test_request_reservation_partial_day_is_truncated() {
        // 5日と23時間は「5日」として扱う
        let result = request_reservation(
            &equipment(5),
            PersonId::from_i64(2),
            window(at(1, 0), at(6, 23)),
            &[],
            &[],
            at(1, 0),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_accept_reservation_starts_loan_at_acceptance_time() {
        let r = reservation(10, 1, window(at(1, 0), at(3, 0)));
        let accepted_at = at(1, 9);

        let draft =
            accept_reservation(&r, &equipment(5), &[r.clone()], &[], accepted_at).unwrap();

        assert_eq!(draft.window.start(), accepted_at);
        assert_eq!(draft.window.end(), r.window.end());
        assert_eq!(draft.person_id, r.person_id);
        assert_eq!(draft.equipment_id, r.equipment_id);
        assert_eq!(draft.atelier_id, AtelierId::from_i64(3));
        assert_eq!(draft.status, LoanStatus::Active);
    }

    #[test]
    fn test_accept_reservation_fails_after_window_elapsed() {
        let r = reservation(10, 1, window(at(1, 0), at(3, 0)));
        let result = accept_reservation(&r, &equipment(5), &[], &[], at(3, 0));
        assert_eq!(
            result.unwrap_err(),
            AcceptReservationError::ReservationElapsed
        );
    }

    #[test]
    fn test_accept_reservation_early_acceptance_must_not_swallow_other_booking() {
        // 後ろの予約を早めに承認すると、前の予約と重なる
        let earlier = reservation(10, 1, window(at(2, 0), at(3, 0)));
        let later = reservation(11, 2, window(at(4, 0), at(6, 0)));
        let result = accept_reservation(
            &later,
            &equipment(5),
            &[earlier.clone(), later.clone()],
            &[],
            at(1, 0),
        );
        assert_eq!(
            result.unwrap_err(),
            AcceptReservationError::Conflict(BookingConflict::Reservation(
                earlier.reservation_id
            ))
        );
    }

    #[test]
    fn test_loan_status_parse() {
        assert_eq!("active".parse::<LoanStatus>(), Ok(LoanStatus::Active));
        assert_eq!("overdue".parse::<LoanStatus>(), Ok(LoanStatus::Overdue));
        assert!("lost".parse::<LoanStatus>().is_err());
    }
}
