use crate::application::ErrorKind;
use crate::domain::PersonValidationError;
use crate::ports::StoreError;
use thiserror::Error;

/// アカウント・セッションのエラー
#[derive(Debug, Error)]
pub enum AccountError {
    /// 登録内容が不正
    #[error("{}", .0.message())]
    InvalidRegistration(PersonValidationError),

    /// メールアドレスが既に使われている
    #[error("Email address is already registered")]
    EmailTaken,

    /// メールアドレスまたはパスワードが違う
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 有効なセッションがない、またはロールが未設定
    #[error("Authentication required")]
    Unauthenticated,

    /// 利用者が存在しない
    #[error("Person not found")]
    PersonNotFound,

    /// 権限がない
    #[error("Not allowed: {0}")]
    Forbidden(&'static str),

    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),

    /// ストアのエラー
    #[error("Account store error")]
    StoreError(#[source] StoreError),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidRegistration(_) => ErrorKind::InvalidInput,
            AccountError::EmailTaken => ErrorKind::Conflict,
            AccountError::InvalidCredentials | AccountError::Unauthenticated => {
                ErrorKind::Unauthenticated
            }
            AccountError::PersonNotFound => ErrorKind::NotFound,
            AccountError::Forbidden(_) => ErrorKind::Forbidden,
            AccountError::PasswordHashing(_) | AccountError::StoreError(_) => {
                ErrorKind::PersistenceFailure
            }
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AccountError::EmailTaken,
            other => AccountError::StoreError(other),
        }
    }
}

/// アカウントサービスの Result型
pub type Result<T> = std::result::Result<T, AccountError>;
