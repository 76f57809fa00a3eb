use thiserror::Error;

use crate::domain::BookingConflict;

/// ストアポート共通のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    /// 書き込み時の再検証で、既存の予約・貸出との重複が見つかった
    #[error("booking window overlaps {0:?}")]
    Overlap(BookingConflict),

    /// 対象の行が存在しない
    #[error("record not found")]
    NotFound,

    /// メールアドレスの一意制約違反
    #[error("email address is already registered")]
    DuplicateEmail,

    /// バックエンドの障害（接続断、直列化失敗など）
    #[error("storage backend failure")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// ストアポートの Result型
pub type Result<T> = std::result::Result<T, StoreError>;
