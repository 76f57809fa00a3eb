//! Argon2id によるパスワードのハッシュ化と照合

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use super::errors::AccountError;

/// パスワードをハッシュ化し、PHC文字列で返す
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::PasswordHashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// PHC文字列とパスワードを照合する
///
/// 不一致は`Ok(false)`、ハッシュの形式不正はエラー。
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AccountError> {
    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|e| AccountError::PasswordHashing(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AccountError::PasswordHashing(e.to_string())),
    }
}

/// `hash_password`をブロッキング用スレッドで実行する
///
/// Argon2は重い計算なので、非同期ランタイムのワーカーを塞がない。
pub async fn hash_password_blocking(password: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountError::PasswordHashing(e.to_string()))?
}

/// `verify_password`をブロッキング用スレッドで実行する
pub async fn verify_password_blocking(
    password: String,
    hash: String,
) -> Result<bool, AccountError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AccountError::PasswordHashing(e.to_string()))?
}
