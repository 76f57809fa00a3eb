use crate::application::ErrorKind;
use crate::domain::{AcceptReservationError, BookingConflict, RequestReservationError};
use crate::ports::StoreError;
use thiserror::Error;

/// 予約・貸出ライフサイクルのエラー
#[derive(Debug, Error)]
pub enum BookingError {
    /// 機材が存在しない
    #[error("Equipment not found")]
    EquipmentNotFound,

    /// 予約が存在しない
    #[error("Reservation not found")]
    ReservationNotFound,

    /// 貸出が存在しない
    #[error("Loan not found")]
    LoanNotFound,

    /// 開始・終了の指定が不正（終了が開始以前）
    #[error("Reservation end must be after its start")]
    InvalidWindow,

    /// 既存の予約と重なる
    #[error("Equipment already has a reservation in this period")]
    ReservationConflict(BookingConflict),

    /// 既存の貸出と重なる
    #[error("Equipment is already on loan in this period")]
    LoanConflict(BookingConflict),

    /// 開始時刻が過去
    #[error("Reservation cannot start in the past")]
    StartInPast,

    /// 最大貸出日数の超過
    #[error("Loan duration cannot exceed the maximum of {max_days} days")]
    DurationExceeded { max_days: i32, requested_days: i64 },

    /// 承認時刻から始まる貸出が、先に入っている予約・貸出と重なる
    ///
    /// 貸出は承認時刻から始まるため、後の予約を早く承認すると前の予約を飲み込む。
    /// 前の予約が片付くまで承認を待つ必要がある。
    #[error("Loan would start before an earlier booking of this equipment ends")]
    AcceptanceBlocked(BookingConflict),

    /// 予約の終了時刻を過ぎてから承認しようとした
    #[error("Reservation period has already ended")]
    ReservationElapsed,

    /// 権限がない
    #[error("Not allowed: {0}")]
    Forbidden(&'static str),

    /// ストアのエラー
    #[error("Booking store error")]
    StoreError(#[source] StoreError),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::EquipmentNotFound
            | BookingError::ReservationNotFound
            | BookingError::LoanNotFound => ErrorKind::NotFound,
            BookingError::ReservationConflict(_)
            | BookingError::LoanConflict(_)
            | BookingError::AcceptanceBlocked(_) => ErrorKind::Conflict,
            BookingError::StartInPast
            | BookingError::DurationExceeded { .. }
            | BookingError::ReservationElapsed => ErrorKind::PolicyViolation,
            BookingError::InvalidWindow => ErrorKind::InvalidInput,
            BookingError::Forbidden(_) => ErrorKind::Forbidden,
            BookingError::StoreError(_) => ErrorKind::PersistenceFailure,
        }
    }

    fn from_conflict(conflict: BookingConflict) -> Self {
        match conflict {
            BookingConflict::Reservation(_) => BookingError::ReservationConflict(conflict),
            BookingConflict::Loan(_) => BookingError::LoanConflict(conflict),
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            // 書き込み時の再検証で見つかった重複も、通常の重複と同じに扱う
            StoreError::Overlap(conflict) => BookingError::from_conflict(conflict),
            other => BookingError::StoreError(other),
        }
    }
}

impl From<RequestReservationError> for BookingError {
    fn from(err: RequestReservationError) -> Self {
        match err {
            RequestReservationError::Conflict(conflict) => BookingError::from_conflict(conflict),
            RequestReservationError::StartInPast => BookingError::StartInPast,
            RequestReservationError::DurationExceeded {
                max_days,
                requested_days,
            } => BookingError::DurationExceeded {
                max_days,
                requested_days,
            },
        }
    }
}

impl From<AcceptReservationError> for BookingError {
    fn from(err: AcceptReservationError) -> Self {
        match err {
            AcceptReservationError::ReservationElapsed => BookingError::ReservationElapsed,
            AcceptReservationError::Conflict(conflict) => BookingError::AcceptanceBlocked(conflict),
        }
    }
}

/// 予約・貸出ライフサイクルの Result型
pub type Result<T> = std::result::Result<T, BookingError>;
