use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EquipmentId, Loan, LoanId, PersonId, Reservation, ReservationId, TimeWindow};

/// イベント：予約が申請された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequested {
    pub reservation_id: ReservationId,
    pub equipment_id: EquipmentId,
    pub person_id: PersonId,
    pub window: TimeWindow,
    pub requested_at: DateTime<Utc>,
}

/// イベント：予約が承認され、貸出になった
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationAccepted {
    pub reservation_id: ReservationId,
    pub loan_id: LoanId,
    pub equipment_id: EquipmentId,
    pub person_id: PersonId,
    pub loan_window: TimeWindow,
    pub accepted_by: PersonId,
    pub accepted_at: DateTime<Utc>,
}

/// イベント：予約が取り消された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCancelled {
    pub reservation_id: ReservationId,
    pub equipment_id: EquipmentId,
    pub person_id: PersonId,
    pub cancelled_by: PersonId,
    pub cancelled_at: DateTime<Utc>,
}

/// イベント：貸出が返却された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReturned {
    pub loan_id: LoanId,
    pub equipment_id: EquipmentId,
    pub person_id: PersonId,
    pub returned_by: PersonId,
    pub returned_at: DateTime<Utc>,
}

/// 予約・貸出の履歴イベント
///
/// 予約・貸出の行は遷移時に削除されるため、経緯はこのイベントにだけ残る。
/// ストアは遷移と同じトランザクションで追記する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    ReservationRequested(ReservationRequested),
    ReservationAccepted(ReservationAccepted),
    ReservationCancelled(ReservationCancelled),
    LoanReturned(LoanReturned),
}

impl BookingEvent {
    pub fn reservation_requested(reservation: &Reservation) -> Self {
        BookingEvent::ReservationRequested(ReservationRequested {
            reservation_id: reservation.reservation_id,
            equipment_id: reservation.equipment_id,
            person_id: reservation.person_id,
            window: reservation.window,
            requested_at: reservation.created_at,
        })
    }

    /// 貸出の開始時刻を承認時刻として記録する
    pub fn reservation_accepted(
        reservation_id: ReservationId,
        loan: &Loan,
        accepted_by: PersonId,
    ) -> Self {
        BookingEvent::ReservationAccepted(ReservationAccepted {
            reservation_id,
            loan_id: loan.loan_id,
            equipment_id: loan.equipment_id,
            person_id: loan.person_id,
            loan_window: loan.window,
            accepted_by,
            accepted_at: loan.window.start(),
        })
    }

    pub fn reservation_cancelled(
        reservation: &Reservation,
        cancelled_by: PersonId,
        cancelled_at: DateTime<Utc>,
    ) -> Self {
        BookingEvent::ReservationCancelled(ReservationCancelled {
            reservation_id: reservation.reservation_id,
            equipment_id: reservation.equipment_id,
            person_id: reservation.person_id,
            cancelled_by,
            cancelled_at,
        })
    }

    pub fn loan_returned(loan: &Loan, returned_by: PersonId, returned_at: DateTime<Utc>) -> Self {
        BookingEvent::LoanReturned(LoanReturned {
            loan_id: loan.loan_id,
            equipment_id: loan.equipment_id,
            person_id: loan.person_id,
            returned_by,
            returned_at,
        })
    }

    /// イベント種別（永続化時の識別子）
    pub fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::ReservationRequested(_) => "ReservationRequested",
            BookingEvent::ReservationAccepted(_) => "ReservationAccepted",
            BookingEvent::ReservationCancelled(_) => "ReservationCancelled",
            BookingEvent::LoanReturned(_) => "LoanReturned",
        }
    }

    pub fn equipment_id(&self) -> EquipmentId {
        match self {
            BookingEvent::ReservationRequested(e) => e.equipment_id,
            BookingEvent::ReservationAccepted(e) => e.equipment_id,
            BookingEvent::ReservationCancelled(e) => e.equipment_id,
            BookingEvent::LoanReturned(e) => e.equipment_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BookingEvent::ReservationRequested(e) => e.requested_at,
            BookingEvent::ReservationAccepted(e) => e.accepted_at,
            BookingEvent::ReservationCancelled(e) => e.cancelled_at,
            BookingEvent::LoanReturned(e) => e.returned_at,
        }
    }
}
