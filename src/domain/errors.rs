use serde::Serialize;

use super::BookingConflict;

/// 予約申請のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestReservationError {
    /// 既存の予約・貸出と時間帯が重なる
    Conflict(BookingConflict),
    /// 開始時刻が過去
    StartInPast,
    /// 期間が機材の最大貸出日数を超える
    DurationExceeded { max_days: i32, requested_days: i64 },
}

impl From<BookingConflict> for RequestReservationError {
    fn from(conflict: BookingConflict) -> Self {
        RequestReservationError::Conflict(conflict)
    }
}

/// 予約承認のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptReservationError {
    /// 予約の終了時刻を過ぎている
    ReservationElapsed,
    /// 前倒しになった貸出期間が他の予約・貸出と重なる
    Conflict(BookingConflict),
}

impl From<BookingConflict> for AcceptReservationError {
    fn from(conflict: BookingConflict) -> Self {
        AcceptReservationError::Conflict(conflict)
    }
}

/// 機材の入力項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentField {
    Name,
    ManufactureDate,
    PurchaseDate,
    MaxLoanDurationDays,
}

/// 機材登録の項目別エラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipmentValidationError {
    pub field: EquipmentField,
    pub message: &'static str,
}

impl EquipmentValidationError {
    pub fn new(field: EquipmentField, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// 利用者登録のエラー（最初に見つかった不正項目）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonValidationError {
    FirstName,
    Surname,
    Email,
    Password,
}

impl PersonValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            PersonValidationError::FirstName => "first name must be between 2 and 50 characters",
            PersonValidationError::Surname => "surname must be between 2 and 50 characters",
            PersonValidationError::Email => "email address is not valid",
            PersonValidationError::Password => "password must be between 4 and 50 characters",
        }
    }
}
