use serde::{Deserialize, Serialize};

use super::{Loan, LoanId, Reservation, ReservationId, TimeWindow};

/// 希望時間帯をふさいでいる既存の予約・貸出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BookingConflict {
    Reservation(ReservationId),
    Loan(LoanId),
}

/// 純粋関数：希望時間帯が既存の予約・貸出と重ならないか判定する
///
/// 予約と貸出は独立に判定し、予約を先に見る。
/// `ignore`に指定した予約は判定から除外する（承認時に自分自身を除くため）。
///
/// # 戻り値
/// 空いていれば`Ok(())`、重なっていれば最初に見つかった相手
pub fn check_availability(
    window: &TimeWindow,
    reservations: &[Reservation],
    loans: &[Loan],
    ignore: Option<ReservationId>,
) -> Result<(), BookingConflict> {
    if let Some(r) = reservations
        .iter()
        .filter(|r| Some(r.reservation_id) != ignore)
        .find(|r| r.window.overlaps(window))
    {
        return Err(BookingConflict::Reservation(r.reservation_id));
    }

    if let Some(l) = loans.iter().find(|l| l.window.overlaps(window)) {
        return Err(BookingConflict::Loan(l.loan_id));
    }

    Ok(())
}

/// 純粋関数：希望時間帯が空いているか
pub fn is_available(window: &TimeWindow, reservations: &[Reservation], loans: &[Loan]) -> bool {
    check_availability(window, reservations, loans, None).is_ok()
}
