use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AtelierId, EquipmentId, EquipmentTypeId, LoanId, PersonId, ReservationId, Role};

/// コマンド：機材の予約を申請する
///
/// 予約者は常に呼び出し元本人（代理予約はできない）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestReservation {
    pub equipment_id: EquipmentId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：予約を承認する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptReservation {
    pub reservation_id: ReservationId,
    pub accepted_at: DateTime<Utc>,
}

/// コマンド：予約を取り消す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReservation {
    pub reservation_id: ReservationId,
    pub cancelled_at: DateTime<Utc>,
}

/// コマンド：貸出を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
}

/// コマンド：利用者登録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPerson {
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    pub registered_at: DateTime<Utc>,
}

/// コマンド：ロール変更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRole {
    pub person_id: PersonId,
    pub role: Role,
}

/// コマンド：機材登録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEquipment {
    pub name: String,
    pub atelier_id: AtelierId,
    pub type_id: EquipmentTypeId,
    pub manufacture_date: NaiveDate,
    pub purchase_date: NaiveDate,
    pub max_loan_duration_days: i32,
}

/// コマンド：機材情報の編集
///
/// 全項目を置き換える。登録時と同じ検証を通す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEquipment {
    pub equipment_id: EquipmentId,
    pub name: String,
    pub atelier_id: AtelierId,
    pub type_id: EquipmentTypeId,
    pub manufacture_date: NaiveDate,
    pub purchase_date: NaiveDate,
    pub max_loan_duration_days: i32,
}

/// コマンド：自分のプロフィール（氏名・メールアドレス）の編集
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub first_name: String,
    pub surname: String,
    pub email: String,
}
