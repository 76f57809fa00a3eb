use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PersonId, PersonValidationError, Role};

/// 利用者
///
/// ロールは未設定・未知の値があり得るため`Option`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub person_id: PersonId,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub role: Option<Role>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// 採番前の利用者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDraft {
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub role: Option<Role>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 純粋関数：登録内容を検証する
///
/// パスワードはハッシュ化前の平文で検証する。
pub fn validate_registration(
    first_name: &str,
    surname: &str,
    email: &str,
    password: &str,
) -> Result<(), PersonValidationError> {
    validate_profile(first_name, surname, email)?;

    if !(4..=50).contains(&password.chars().count()) {
        return Err(PersonValidationError::Password);
    }
    Ok(())
}

/// 純粋関数：氏名とメールアドレスを検証する（登録・プロフィール編集で共通）
pub fn validate_profile(
    first_name: &str,
    surname: &str,
    email: &str,
) -> Result<(), PersonValidationError> {
    let within = |s: &str, min: usize, max: usize| {
        let len = s.trim().chars().count();
        len >= min && len <= max
    };

    if !within(first_name, 2, 50) {
        return Err(PersonValidationError::FirstName);
    }
    if !within(surname, 2, 50) {
        return Err(PersonValidationError::Surname);
    }
    if !is_plausible_email(email) {
        return Err(PersonValidationError::Email);
    }
    Ok(())
}

/// メールアドレスの簡易チェック（local@domain.tld）
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
