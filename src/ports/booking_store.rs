use crate::domain::{
    AtelierId, BookingEvent, EquipmentId, Loan, LoanDraft, LoanId, PersonId, Reservation,
    ReservationDraft, ReservationId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::Result;

/// 予約・貸出ストアポート
///
/// 予約と貸出の行、および履歴イベントの永続化を抽象化する。
/// 書き込み系メソッドはそれぞれ1つのトランザクションで完結し、
/// 履歴イベントも同じトランザクションで追記する。
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// 機材の全予約
    async fn reservations_for_equipment(&self, equipment_id: EquipmentId)
    -> Result<Vec<Reservation>>;

    /// 機材の全貸出
    async fn loans_for_equipment(&self, equipment_id: EquipmentId) -> Result<Vec<Loan>>;

    async fn get_reservation(&self, reservation_id: ReservationId) -> Result<Option<Reservation>>;

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 利用者本人の予約（ダッシュボード用）
    async fn reservations_for_person(&self, person_id: PersonId) -> Result<Vec<Reservation>>;

    /// 利用者本人の貸出（ダッシュボード用）
    async fn loans_for_person(&self, person_id: PersonId) -> Result<Vec<Loan>>;

    /// 指定アトリエの機材に対する予約
    async fn reservations_for_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Reservation>>;

    /// 指定アトリエの機材に対する貸出
    async fn loans_for_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Loan>>;

    async fn all_reservations(&self) -> Result<Vec<Reservation>>;

    async fn all_loans(&self) -> Result<Vec<Loan>>;

    /// 予約を挿入する
    ///
    /// 同じ機材の予約・貸出との重複をトランザクション内で再検証し、
    /// 重なっていれば`StoreError::Overlap`を返す。
    async fn insert_reservation(&self, draft: ReservationDraft) -> Result<Reservation>;

    /// 予約を削除し、貸出を作成する
    ///
    /// 削除と作成は同一トランザクション。どちらかが失敗すれば両方ロールバックする。
    /// 予約がなければ`StoreError::NotFound`。
    async fn promote_reservation(
        &self,
        reservation_id: ReservationId,
        draft: LoanDraft,
        accepted_by: PersonId,
    ) -> Result<Loan>;

    /// 予約を削除する。なければ`StoreError::NotFound`。
    async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        cancelled_by: PersonId,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Reservation>;

    /// 貸出を削除する（返却）。なければ`StoreError::NotFound`。
    async fn return_loan(
        &self,
        loan_id: LoanId,
        returned_by: PersonId,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan>;

    /// 機材の履歴イベント（発生順）
    async fn history_for_equipment(&self, equipment_id: EquipmentId) -> Result<Vec<BookingEvent>>;
}
