use crate::application::ErrorKind;
use crate::domain::EquipmentValidationError;
use crate::ports::StoreError;
use thiserror::Error;

/// 在庫管理のエラー
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Atelier not found")]
    AtelierNotFound,

    #[error("Equipment type not found")]
    EquipmentTypeNotFound,

    #[error("Equipment not found")]
    EquipmentNotFound,

    #[error("Person not found")]
    PersonNotFound,

    /// 所属していない利用者を外そうとした
    #[error("Person is not a member of this atelier")]
    NotAMember,

    /// アトリエ名・種別名の長さが不正
    #[error("{0}")]
    InvalidName(&'static str),

    /// 機材の登録内容が業務ルールに反する（項目ごとの違反）
    #[error("Equipment details are invalid")]
    InvalidEquipment(Vec<EquipmentValidationError>),

    /// 権限がない
    #[error("Not allowed: {0}")]
    Forbidden(&'static str),

    /// ストアのエラー
    #[error("Inventory store error")]
    StoreError(#[source] StoreError),
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::AtelierNotFound
            | InventoryError::EquipmentTypeNotFound
            | InventoryError::EquipmentNotFound
            | InventoryError::PersonNotFound
            | InventoryError::NotAMember => ErrorKind::NotFound,
            InventoryError::InvalidName(_) => ErrorKind::InvalidInput,
            InventoryError::InvalidEquipment(_) => ErrorKind::PolicyViolation,
            InventoryError::Forbidden(_) => ErrorKind::Forbidden,
            InventoryError::StoreError(_) => ErrorKind::PersistenceFailure,
        }
    }
}

impl From<StoreError> for InventoryError {
    fn from(err: StoreError) -> Self {
        InventoryError::StoreError(err)
    }
}

/// 在庫管理の Result型
pub type Result<T> = std::result::Result<T, InventoryError>;
