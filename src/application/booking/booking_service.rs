use crate::application::ServiceDependencies;
use crate::domain::{
    self, BookingEvent, Caller, Equipment, EquipmentId, Loan, Reservation, TimeWindow,
    commands::*,
};
use crate::ports::StoreError;
use chrono::{DateTime, Utc};

use super::errors::{BookingError, Result};

/// 機材を取得するヘルパー関数
///
/// 存在しなければ`EquipmentNotFound`。
async fn load_equipment(deps: &ServiceDependencies, equipment_id: EquipmentId) -> Result<Equipment> {
    deps.inventory_store
        .get_equipment(equipment_id)
        .await?
        .ok_or(BookingError::EquipmentNotFound)
}

/// 機材の予約・貸出をまとめて取得するヘルパー関数
async fn load_bookings(
    deps: &ServiceDependencies,
    equipment_id: EquipmentId,
) -> Result<(Vec<Reservation>, Vec<Loan>)> {
    let (reservations, loans) = futures::try_join!(
        deps.booking_store.reservations_for_equipment(equipment_id),
        deps.booking_store.loans_for_equipment(equipment_id),
    )?;
    Ok((reservations, loans))
}

/// 指定の時間帯に機材が空いているか（読み取りのみ）
///
/// # エラー
/// - InvalidWindow: 終了が開始以前
/// - EquipmentNotFound: 機材が存在しない
pub async fn is_available(
    deps: &ServiceDependencies,
    equipment_id: EquipmentId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<bool> {
    let window = TimeWindow::new(start, end).map_err(|_| BookingError::InvalidWindow)?;
    load_equipment(deps, equipment_id).await?;

    let (reservations, loans) = load_bookings(deps, equipment_id).await?;
    Ok(domain::is_available(&window, &reservations, &loans))
}

/// 予約を申請する
///
/// ビジネスルール（この順に判定する）：
/// 1. 機材が存在すること
/// 2. 既存の予約・貸出と時間帯が重ならないこと
/// 3. 開始が過去でないこと
/// 4. 期間が機材の最大貸出日数を超えないこと
///
/// 予約者は呼び出し元本人。
///
/// # 一貫性保証
///
/// 機材ごとのロックを保持したまま判定と挿入を行う。
/// さらにストアが挿入トランザクション内で重複を再検証するため、
/// 複数プロセスから同時に申請されても両方が成功することはない。
pub async fn request_reservation(
    deps: &ServiceDependencies,
    caller: &Caller,
    cmd: RequestReservation,
) -> Result<Reservation> {
    let window = TimeWindow::new(cmd.start, cmd.end).map_err(|_| BookingError::InvalidWindow)?;

    // 1. 機材の存在確認
    let equipment = load_equipment(deps, cmd.equipment_id).await?;

    let _guard = deps.equipment_locks.acquire(equipment.equipment_id).await;

    // 2〜4. ドメイン層の純粋関数で判定
    let (reservations, loans) = load_bookings(deps, equipment.equipment_id).await?;
    let draft = domain::request_reservation(
        &equipment,
        caller.person_id,
        window,
        &reservations,
        &loans,
        cmd.requested_at,
    )
    .inspect_err(|e| {
        tracing::warn!(
            equipment_id = %equipment.equipment_id,
            person_id = %caller.person_id,
            reason = ?e,
            "reservation rejected"
        )
    })?;

    // 5. 永続化（ストア側でも重複を再検証）
    let reservation = deps.booking_store.insert_reservation(draft).await?;

    tracing::info!(
        reservation_id = %reservation.reservation_id,
        equipment_id = %reservation.equipment_id,
        person_id = %reservation.person_id,
        "reservation requested"
    );

    Ok(reservation)
}

/// 予約を承認し、貸出に変換する
///
/// ビジネスルール：
/// - 呼び出し元が職員ロールで、認可範囲内であること
/// - 予約が存在すること
/// - 貸出は承認時刻に開始し、予約の終了時刻に終了する
/// - 予約の削除と貸出の作成は単一トランザクション
pub async fn accept_reservation(
    deps: &ServiceDependencies,
    caller: &Caller,
    cmd: AcceptReservation,
) -> Result<Loan> {
    if !caller.role.is_staff() {
        return Err(BookingError::Forbidden("only staff may accept reservations"));
    }

    // 1. 予約の存在確認（ロック対象の機材を知るため）
    let reservation = deps
        .booking_store
        .get_reservation(cmd.reservation_id)
        .await?
        .ok_or(BookingError::ReservationNotFound)?;

    let _guard = deps.equipment_locks.acquire(reservation.equipment_id).await;

    // 2. ロック取得中に取り消されていないか確認
    let reservation = deps
        .booking_store
        .get_reservation(cmd.reservation_id)
        .await?
        .ok_or(BookingError::ReservationNotFound)?;

    let equipment = load_equipment(deps, reservation.equipment_id).await?;

    // 3. 認可
    if !domain::can_manage_booking(caller, equipment.atelier_id, deps.authorization_scope) {
        return Err(BookingError::Forbidden(
            "reservation belongs to an atelier outside your scope",
        ));
    }

    // 4. ドメイン層の純粋関数で貸出を組み立てる
    let (reservations, loans) = load_bookings(deps, equipment.equipment_id).await?;
    let draft = domain::accept_reservation(
        &reservation,
        &equipment,
        &reservations,
        &loans,
        cmd.accepted_at,
    )?;

    // 5. 予約削除＋貸出作成（アトミック）
    let loan = deps
        .booking_store
        .promote_reservation(reservation.reservation_id, draft, caller.person_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => BookingError::ReservationNotFound,
            StoreError::Overlap(conflict) => BookingError::AcceptanceBlocked(conflict),
            other => other.into(),
        })?;

    tracing::info!(
        reservation_id = %reservation.reservation_id,
        loan_id = %loan.loan_id,
        equipment_id = %loan.equipment_id,
        accepted_by = %caller.person_id,
        "reservation accepted"
    );

    Ok(loan)
}

/// 予約を取り消す
///
/// ビジネスルール：
/// - 予約が存在すること
/// - 予約者本人、または認可範囲内の職員であること
pub async fn cancel_reservation(
    deps: &ServiceDependencies,
    caller: &Caller,
    cmd: CancelReservation,
) -> Result<()> {
    let reservation = deps
        .booking_store
        .get_reservation(cmd.reservation_id)
        .await?
        .ok_or(BookingError::ReservationNotFound)?;

    let equipment = load_equipment(deps, reservation.equipment_id).await?;

    if !domain::can_cancel_reservation(
        caller,
        reservation.person_id,
        equipment.atelier_id,
        deps.authorization_scope,
    ) {
        return Err(BookingError::Forbidden(
            "only the requester or staff may cancel a reservation",
        ));
    }

    deps.booking_store
        .cancel_reservation(cmd.reservation_id, caller.person_id, cmd.cancelled_at)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => BookingError::ReservationNotFound,
            other => other.into(),
        })?;

    tracing::info!(
        reservation_id = %cmd.reservation_id,
        cancelled_by = %caller.person_id,
        "reservation cancelled"
    );

    Ok(())
}

/// 貸出を返却する（貸出の行を削除する）
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 認可範囲内の職員であること
/// - 期間や利用者の再検証は行わない
pub async fn return_loan(deps: &ServiceDependencies, caller: &Caller, cmd: ReturnLoan) -> Result<()> {
    if !caller.role.is_staff() {
        return Err(BookingError::Forbidden("only staff may close loans"));
    }

    let loan = deps
        .booking_store
        .get_loan(cmd.loan_id)
        .await?
        .ok_or(BookingError::LoanNotFound)?;

    if !domain::can_manage_booking(caller, loan.atelier_id, deps.authorization_scope) {
        return Err(BookingError::Forbidden(
            "loan belongs to an atelier outside your scope",
        ));
    }

    deps.booking_store
        .return_loan(cmd.loan_id, caller.person_id, cmd.returned_at)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => BookingError::LoanNotFound,
            other => other.into(),
        })?;

    tracing::info!(
        loan_id = %cmd.loan_id,
        returned_by = %caller.person_id,
        "loan returned"
    );

    Ok(())
}

/// 機材の予約・貸出履歴
pub async fn equipment_history(
    deps: &ServiceDependencies,
    equipment_id: EquipmentId,
) -> Result<Vec<BookingEvent>> {
    load_equipment(deps, equipment_id).await?;
    Ok(deps.booking_store.history_for_equipment(equipment_id).await?)
}
